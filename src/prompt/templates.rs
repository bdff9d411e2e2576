//! Fixed instructional templates.
//!
//! The closing templates take the newline-joined requirement history in
//! place of `{requirements}`. The implement preamble takes rendered example
//! markers in place of `{start_marker}` and `{end_marker}`.

use crate::domain::Mode;
use crate::stream::protocol::{render_end, render_start};

const EXAMPLE_FILENAME: &str = "file1.py";

pub const IMPLEMENT_PREAMBLE: &str = r#"
You are a software development team. I'm going to provide you with your codebase, then we'll build some features.

Take careful care to follow the requested response format, using "{start_marker}" and "{end_marker}" delimiters when outputting files and "SUMMARY:" and "FILES:" section headers to indicate the respective parts of the chat completion response.
Always include an "ESTIMATED CHARACTERS:" heading followed by an estimated number of total characters in the modified files after implementing the requested changes (i.e. total number of characters in these files, not just the number of characters changed)- it is fine if this number is not exact but always provide an estimate and express it with digits only (no commas/formatting).

Take a modular approach and implement DRY code - break into separate modules if/when possible.

Here's my codebase:
"#;

pub const IMPLEMENT_CLOSING: &str = r#"
That's my codebase.

Here are the features I need you to build:
{requirements}

Return a brief summary of changes, estimated character count of all modified files, and the complete contents of each file required to be modified/created in the implementation of these requirements - no truncation.
Your response should follow the following format:

## SUMMARY:
[Changing X to implement Y, lorem ipsum]
- Change 1 in file1.py
- Change 2 in file1.py
- Change 3 in lib/file2.py

## ESTIMATED CHARACTERS:
1234

## FILES:
===.= ==== FILENAME: demofile1.py = ===== =========
```python
import requests

print("Hello world")
```
===.= ==== EOF: demofile1.py = ===== =========
===.= ==== FILENAME: lib/demofile2.py = ===== =========
# Just another demo file
===.= ==== EOF: lib/demofile2.py = ===== =========
"#;

pub const QUESTION_PREAMBLE: &str = r#"
You are a principle software architect and I am going to ask you a question about my codebase. Do not try to make any implementation suggestions unless explicitly requested. Here is my codebase:
"#;

pub const QUESTION_CLOSING: &str = r#"
That's my codebase - please answer my question: {requirements}
"#;

pub fn preamble(mode: Mode) -> String {
    match mode {
        Mode::Implement => IMPLEMENT_PREAMBLE
            .replace("{start_marker}", &render_start(EXAMPLE_FILENAME))
            .replace("{end_marker}", &render_end(EXAMPLE_FILENAME)),
        Mode::Question => QUESTION_PREAMBLE.to_string(),
    }
}

pub fn closing(mode: Mode, requirements_history: &[String]) -> String {
    let template = match mode {
        Mode::Implement => IMPLEMENT_CLOSING,
        Mode::Question => QUESTION_CLOSING,
    };
    template.replace("{requirements}", &requirements_history.join("\n"))
}
