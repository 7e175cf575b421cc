// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_page_content(blocks: usize) -> String {
    let lines = [
        "<h2>Section heading</h2>",
        "Plain paragraph with some words in it.",
        "Mixed <b>bold</b>, <i>italic</i> and <u>underlined</u> text &amp; entities.",
        "<input type=\"checkbox\" checked /> Finished task",
        "<blockquote>Quoted remark from a meeting</blockquote>",
        "<ul><li>first</li><li>second</li></ul>",
        "<pre>fn main() {}</pre>",
    ];
    (0..blocks)
        .map(|i| lines[i % lines.len()])
        .collect::<Vec<_>>()
        .join("\n")
}
