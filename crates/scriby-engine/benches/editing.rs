use criterion::{Criterion, criterion_group, criterion_main};
use scriby_engine::export::markup_to_markdown;
use scriby_engine::{FormatCommand, Page, RichText, highlight};
use std::hint::black_box;
mod common;

fn bench_block_editing(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_editing");
    group.sample_size(20);

    let content = common::generate_page_content(500);

    group.bench_function("from_content", |b| {
        b.iter(|| {
            let page = Page::from_content("Bench", black_box(content.as_str()));
            black_box(page);
        });
    });

    group.bench_function("edit_block_text", |b| {
        let mut page = Page::from_content("Bench", content.as_str());
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let text = if toggle { "typed text" } else { "typed text!" };
            black_box(page.edit_block_text(250, text));
        });
    });

    group.bench_function("toggle_bold", |b| {
        let mut page = Page::from_content("Bench", content.as_str());
        b.iter(|| {
            black_box(page.apply_format(2, FormatCommand::Bold, Some(0..5)));
        });
    });

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");
    group.sample_size(20);

    let content = common::generate_page_content(500);
    let mut page = Page::from_content("Bench", content.as_str());

    group.bench_function("parse_rich_text", |b| {
        b.iter(|| {
            for block in &page.blocks {
                black_box(RichText::parse(&block.html));
            }
        });
    });

    group.bench_function("highlight", |b| {
        b.iter(|| black_box(highlight(black_box(&page.content), "section")));
    });

    group.bench_function("render_blocks", |b| {
        b.iter(|| black_box(page.render_blocks("words")));
    });

    group.bench_function("markup_to_markdown", |b| {
        b.iter(|| black_box(markup_to_markdown(black_box(&content))));
    });

    group.finish();
}

criterion_group!(benches, bench_block_editing, bench_rendering);
criterion_main!(benches);
