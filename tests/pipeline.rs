use csvpeek::loader::load;
use csvpeek::{PipelineParams, SortDirection, Table, paginate, parse, run, search, sort};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn employees() -> Table {
    let (_, table) = load(&fixture("employees.csv")).expect("fixture loads");
    table
}

#[test]
fn fixture_matches_inline_text() {
    let inline = parse("姓名,年齡,部門\n張三,25,業務部\n李四,30,技術部\n王五,28,行銷部\n趙六,35,財務部\n錢七,27,人資部");
    assert_eq!(employees(), inline);
}

#[test]
fn employee_scenario() {
    let table = employees();
    assert_eq!(table.headers, vec!["姓名", "年齡", "部門"]);
    assert_eq!(table.total_row_count, 5);

    let found = search(&table, "技術");
    assert_eq!(found.rows.len(), 1);
    assert_eq!(found.rows[0], vec!["李四", "30", "技術部"]);

    let by_age = sort(&table, 1, SortDirection::Ascending);
    assert_eq!(by_age.rows[0][1], "25");
    assert_eq!(by_age.rows[4][1], "35");

    let first = paginate(&table, 1, 2);
    let last = paginate(&table, 3, 2);
    assert_eq!(first.rows.len(), 2);
    assert_eq!(last.rows.len(), 1);
    for page in 1..=3 {
        assert_eq!(paginate(&table, page, 2).total_row_count, 5);
    }
}

#[test]
fn product_quoting() {
    let (_, table) = load(&fixture("products.csv")).expect("fixture loads");
    assert_eq!(table.headers, vec!["名稱", "描述", "價格"]);
    assert_eq!(table.rows[0][1], "這是一個\"特殊\"產品");
    assert_eq!(table.rows[1][1], "包含,逗號,的描述");
    assert_eq!(table.rows[2][1], "普通產品");
    // short row padded to the header width
    assert_eq!(table.rows[3], vec!["產品D", "", ""]);

    let by_price = sort(&table, 2, SortDirection::Ascending);
    let prices: Vec<&str> = by_price.rows.iter().map(|r| r[2].as_str()).collect();
    assert_eq!(prices, vec!["", "9", "10", "100"]);
}

#[test]
fn search_then_page_counts_filtered_rows() {
    let table = employees();
    let mut params = PipelineParams::new(2).with_search_term("部");
    let view = run(&table, &params);
    assert_eq!(view.total_pages, 3);

    params.next_page(view.total_pages);
    params.next_page(view.total_pages);
    let view = run(&table, &params);
    assert_eq!(view.page, 3);
    assert_eq!(view.table.rows.len(), 1);
    assert_eq!(view.filtered_row_count(), 5);

    params.set_search_term("財務");
    let view = run(&table, &params);
    assert_eq!(view.page, 1);
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.table.rows[0][0], "趙六");
}

#[test]
fn run_is_idempotent() {
    let table = employees();
    let params = PipelineParams::new(3)
        .with_sort_column(Some(0))
        .with_sort_direction(SortDirection::Descending);
    assert_eq!(run(&table, &params), run(&table, &params));
}
