//! Renders a monthly report as a PDF document.
//!
//! The document has a summary page, a pie chart of expenses by category when
//! there are any expenses, and the month's transactions in landscape tables of
//! [ROWS_PER_PAGE] rows each. Text uses the standard Helvetica fonts, so
//! characters outside of Latin-1 are replaced with `?`.

use std::f32::consts::{FRAC_PI_2, TAU};

use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::{
    Error,
    currency::Currency,
    dashboard::aggregation::CategoryTotal,
    report::core::{MonthlyReport, ReportLine},
};

/// How many transactions are listed on each table page.
pub const ROWS_PER_PAGE: usize = 25;

const A4_PORTRAIT: (f32, f32) = (595.0, 842.0);
const A4_LANDSCAPE: (f32, f32) = (842.0, 595.0);
const MARGIN: f32 = 50.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

type Rgb = (f32, f32, f32);

const BLACK: Rgb = (0.0, 0.0, 0.0);
const GREY: Rgb = (0.6, 0.6, 0.6);
const SLICE_COLORS: [Rgb; 8] = [
    (0.33, 0.44, 0.78),
    (0.57, 0.80, 0.46),
    (0.98, 0.78, 0.35),
    (0.93, 0.40, 0.40),
    (0.45, 0.75, 0.87),
    (0.23, 0.64, 0.45),
    (0.99, 0.52, 0.32),
    (0.60, 0.38, 0.71),
];

/// The file name used when downloading a report as PDF.
pub fn pdf_file_name(year: i32, month: u8) -> String {
    format!("monthly_report_{year}_{month:02}.pdf")
}

/// Render `report` as the bytes of a PDF file.
///
/// # Errors
/// Returns [Error::PdfError] if the document cannot be encoded.
pub fn write_report_pdf(report: &MonthlyReport) -> Result<Vec<u8>, Error> {
    let mut pages = vec![summary_page(report)];

    if !report.expense_by_category.is_empty() {
        pages.push(expense_pie_page(
            &report.expense_by_category,
            report.base_currency,
        ));
    }

    let total_rows = report.transactions.len();
    for (index, lines) in report.transactions.chunks(ROWS_PER_PAGE).enumerate() {
        let start = index * ROWS_PER_PAGE;
        pages.push(transactions_page(
            lines,
            start + 1,
            (start + ROWS_PER_PAGE).min(total_rows),
            report.base_currency,
        ));
    }

    build_document(pages)
}

/// The drawing operations for one page.
struct Page {
    size: (f32, f32),
    operations: Vec<Operation>,
}

impl Page {
    fn new(size: (f32, f32)) -> Self {
        Self {
            size,
            operations: Vec::new(),
        }
    }

    fn height(&self) -> f32 {
        self.size.1
    }

    fn text(&mut self, x: f32, y: f32, font: &str, size: f32, text: &str) {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_text(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn fill_color(&mut self, (red, green, blue): Rgb) {
        self.operations
            .push(Operation::new("rg", vec![red.into(), green.into(), blue.into()]));
    }

    fn stroke_color(&mut self, (red, green, blue): Rgb) {
        self.operations
            .push(Operation::new("RG", vec![red.into(), green.into(), blue.into()]));
    }

    fn rectangle(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.operations.extend([
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new("f", vec![]),
        ]);
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.operations.extend([
            Operation::new("m", vec![from.0.into(), from.1.into()]),
            Operation::new("l", vec![to.0.into(), to.1.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    /// Fill the closed shape through `points`.
    fn polygon(&mut self, points: &[(f32, f32)]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };

        self.operations
            .push(Operation::new("m", vec![first.0.into(), first.1.into()]));
        for point in rest {
            self.operations
                .push(Operation::new("l", vec![point.0.into(), point.1.into()]));
        }
        self.operations.extend([
            Operation::new("h", vec![]),
            Operation::new("f", vec![]),
        ]);
    }
}

/// Encode `text` for a standard font with WinAnsiEncoding.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            c if c.is_ascii() && !c.is_ascii_control() => c as u8,
            c if ('\u{A0}'..='\u{FF}').contains(&c) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let mut truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

fn money(amount: f64, currency: Currency) -> String {
    format!("{amount:.2} {currency}")
}

fn summary_page(report: &MonthlyReport) -> Page {
    let mut page = Page::new(A4_PORTRAIT);
    let currency = report.base_currency;
    let top = page.height() - MARGIN - 20.0;

    page.text(
        MARGIN,
        top,
        BOLD,
        20.0,
        &format!("Monthly Report: {}-{:02}", report.year, report.month),
    );

    let lines = [
        format!("Income total: {}", money(report.income_total, currency)),
        format!("Expense total: {}", money(report.expense_total, currency)),
        format!("Net: {}", money(report.net, currency)),
        format!("Transactions: {}", report.transaction_count),
        format!("Amounts from other currencies are converted into {currency}."),
    ];
    let mut y = top - 40.0;
    for line in &lines {
        page.text(MARGIN, y, REGULAR, 12.0, line);
        y -= 22.0;
    }

    for (title, totals) in [
        ("Income by category", &report.income_by_category),
        ("Expenses by category", &report.expense_by_category),
    ] {
        if totals.is_empty() {
            continue;
        }

        y -= 16.0;
        page.text(MARGIN, y, BOLD, 13.0, title);
        y -= 20.0;
        for total in totals {
            if y < MARGIN {
                break;
            }
            page.text(MARGIN + 10.0, y, REGULAR, 11.0, &truncate(&total.category, 40));
            page.text(MARGIN + 300.0, y, REGULAR, 11.0, &money(total.total, currency));
            y -= 16.0;
        }
    }

    page
}

fn expense_pie_page(totals: &[CategoryTotal], currency: Currency) -> Page {
    let mut page = Page::new(A4_PORTRAIT);
    let top = page.height() - MARGIN - 20.0;
    page.text(MARGIN, top, BOLD, 18.0, "Expense by Category");

    let sum: f64 = totals.iter().map(|total| total.total).sum();
    let center = (page.size.0 / 2.0, top - 220.0);
    let radius = 170.0;
    let mut start_angle = FRAC_PI_2;

    for (index, total) in totals.iter().enumerate() {
        let fraction = if sum > 0.0 { total.total / sum } else { 0.0 };
        let sweep = TAU * fraction as f32;
        let color = SLICE_COLORS[index % SLICE_COLORS.len()];

        if sweep > 0.0 {
            let steps = ((sweep / 0.05).ceil() as usize).max(1);
            let mut points = Vec::with_capacity(steps + 2);
            points.push(center);
            for step in 0..=steps {
                // Clockwise from twelve o'clock.
                let angle = start_angle - sweep * step as f32 / steps as f32;
                points.push((
                    center.0 + radius * angle.cos(),
                    center.1 + radius * angle.sin(),
                ));
            }

            page.fill_color(color);
            page.polygon(&points);
        }
        start_angle -= sweep;

        let legend_y = center.1 - radius - 40.0 - 18.0 * index as f32;
        if legend_y < MARGIN {
            continue;
        }
        page.fill_color(color);
        page.rectangle(MARGIN, legend_y - 2.0, 10.0, 10.0);
        page.fill_color(BLACK);
        page.text(
            MARGIN + 16.0,
            legend_y,
            REGULAR,
            11.0,
            &format!(
                "{}  {:.1}%  {}",
                truncate(&total.category, 40),
                fraction * 100.0,
                money(total.total, currency)
            ),
        );
    }

    page
}

fn transactions_page(lines: &[ReportLine], first: usize, last: usize, base: Currency) -> Page {
    let mut page = Page::new(A4_LANDSCAPE);
    let width = page.size.0;
    let top = page.height() - MARGIN;

    page.text(
        MARGIN,
        top,
        BOLD,
        14.0,
        &format!("Transactions {first} - {last}"),
    );

    let base_header = format!("In {base}");
    let columns: [(&str, f32, usize); 9] = [
        ("ID", 0.0, 6),
        ("Date", 40.0, 10),
        ("Type", 110.0, 8),
        ("Category", 165.0, 18),
        ("Amount", 285.0, 14),
        ("Currency", 365.0, 4),
        ("Account", 420.0, 18),
        ("Note", 540.0, 24),
        (base_header.as_str(), 680.0, 14),
    ];

    let row_height = 18.0;
    let mut y = top - 30.0;
    for (header, x, _) in columns {
        page.text(MARGIN + x, y, BOLD, 9.0, header);
    }
    page.stroke_color(GREY);
    page.line((MARGIN, y - 5.0), (width - MARGIN, y - 5.0));

    for line in lines {
        y -= row_height;
        let transaction = &line.transaction;
        let cells = [
            transaction.id.to_string(),
            transaction.date.to_string(),
            transaction.direction.to_string(),
            transaction.category.clone(),
            format!("{:.2}", transaction.amount),
            transaction.currency.to_string(),
            line.account.clone(),
            transaction.note.clone(),
            format!("{:.2}", line.amount_in_base),
        ];

        for ((_, x, max_chars), cell) in columns.iter().zip(cells) {
            page.text(MARGIN + x, y, REGULAR, 8.0, &truncate(&cell, *max_chars));
        }
        page.line((MARGIN, y - 5.0), (width - MARGIN, y - 5.0));
    }

    page
}

fn build_document(pages: Vec<Page>) -> Result<Vec<u8>, Error> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let regular_font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_font_id,
            BOLD => bold_font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let (width, height) = page.size;
        let content = Content {
            operations: page.operations,
        };
        let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![Object::from(0.0_f32), 0.0_f32.into(), width.into(), height.into()],
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
            "Resources" => resources_id,
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.compress();

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|error| Error::PdfError(error.to_string()))?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use lopdf::Document;
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        currency::Currency,
        report::core::build_monthly_report,
        test_utils::get_test_connection,
        transaction::{Direction, TransactionBuilder, create_transaction},
    };

    use super::{encode_text, pdf_file_name, truncate, write_report_pdf};

    fn add(conn: &Connection, category: &str, direction: Direction, date: Date) {
        create_transaction(
            TransactionBuilder::new(12.5, Currency::USD, category, direction, date).unwrap(),
            conn,
        )
        .unwrap();
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn empty_month_has_summary_only() {
        let conn = get_test_connection();
        let report = build_monthly_report(2025, 3, Currency::CNY, &conn).unwrap();

        let bytes = write_report_pdf(&report).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn has_pie_page_and_a_table_page_per_25_rows() {
        let conn = get_test_connection();
        add(&conn, "Salary", Direction::Income, date!(2025 - 03 - 01));
        for day in 1..=26 {
            add(
                &conn,
                "Food",
                Direction::Expense,
                Date::from_calendar_date(2025, time::Month::March, day).unwrap(),
            );
        }
        let report = build_monthly_report(2025, 3, Currency::CNY, &conn).unwrap();

        let bytes = write_report_pdf(&report).unwrap();

        // Summary, pie, then 27 transactions over two table pages.
        assert_eq!(page_count(&bytes), 4);
    }

    #[test]
    fn income_only_month_skips_pie_page() {
        let conn = get_test_connection();
        add(&conn, "Salary", Direction::Income, date!(2025 - 03 - 01));
        let report = build_monthly_report(2025, 3, Currency::CNY, &conn).unwrap();

        let bytes = write_report_pdf(&report).unwrap();

        assert_eq!(page_count(&bytes), 2);
    }

    #[test]
    fn text_outside_latin_1_is_replaced() {
        assert_eq!(encode_text("Café ¥5 €2"), b"Caf\xe9 \xa55 \x802".to_vec());
        assert_eq!(encode_text("午餐"), b"??".to_vec());
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate("Groceries", 18), "Groceries");
        assert_eq!(truncate("A very long category name", 10), "A very ...");
    }

    #[test]
    fn file_name_pads_month() {
        assert_eq!(pdf_file_name(2025, 3), "monthly_report_2025_03.pdf");
    }
}
