mod lens;
mod prompts;

pub use lens::{classify, Lens};
pub use prompts::{
    code_prompt, inline_prompt, large_file_prompt, render_content_block, writing_prompt,
};
