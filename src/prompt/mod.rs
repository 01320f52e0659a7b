//! Prompt rendering.

use crate::aggregate::{ContentBlock, PromptContext, StatusEntry};

pub const CONTENT_HEADER: &str = "Content of Affected Files:\n";
pub const CONTENT_FOOTER: &str = "\nUse the files above to provide context on the changes made.\n";
pub const CHANGES_HEADER: &str = "Changes:\n";

/// Render the agent prompt. Pure; output order follows the input slices.
///
/// Callers must not invoke this with both lists empty; see [`PromptContext::is_empty`].
pub fn build_prompt(
    content_blocks: &[ContentBlock],
    status_entries: &[StatusEntry],
    instruction: &str,
) -> String {
    let mut out = String::new();
    if !content_blocks.is_empty() {
        out.push_str(CONTENT_HEADER);
        for block in content_blocks {
            out.push_str(&block.render());
        }
        out.push_str(CONTENT_FOOTER);
    }
    out.push_str(CHANGES_HEADER);
    for entry in status_entries {
        out.push_str(&entry.render());
    }
    out.push('\n');
    out.push_str(instruction);
    out
}

pub fn build_prompt_from(context: &PromptContext, instruction: &str) -> String {
    build_prompt(&context.content_blocks, &context.status_entries, instruction)
}
