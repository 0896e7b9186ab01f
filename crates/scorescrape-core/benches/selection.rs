//! Benchmark table candidate selection over a realistic page: a handful of
//! navigation tables around one 50-column score grid.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scorescrape_core::select::select_best_table;

fn build_page() -> String {
    let mut html = String::from("<html><body>");
    for _ in 0..6 {
        html.push_str(
            "<table><tr><td>首页</td><td>成绩查询</td><td>退出</td></tr></table>",
        );
    }
    html.push_str("<table class=\"a2\"><tr>");
    html.push_str("<td>姓名</td><td>总分</td><td>班级</td>");
    for i in 0..47 {
        html.push_str(&format!("<td>科目{i}</td>"));
    }
    html.push_str("</tr>");
    for row in 0..8 {
        html.push_str("<tr>");
        for col in 0..50 {
            html.push_str(&format!("<td>{}</td>", row * 50 + col));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table></body></html>");
    html
}

fn bench_selection(c: &mut Criterion) {
    let page = build_page();
    c.bench_function("select_best_table", |b| {
        b.iter(|| select_best_table(black_box(&page)))
    });
}

criterion_group!(benches, bench_selection);
criterion_main!(benches);
