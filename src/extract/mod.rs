//! Locates data tables in upstream HTML and pulls out their cell text.
//! Never fails: markup that doesn't fit simply yields no rows.

pub mod rules;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::normalize::fields::collapse_ws;
use crate::types::TableKind;

pub use rules::qualifies;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static TH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").expect("valid selector"));
static BODY_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody tr").expect("valid selector"));
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("valid selector"));

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub cells: Vec<String>,
    /// Raw `src` of the team-cell image, or the row's first image.
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTable {
    pub headers: Vec<String>,
    pub rows: Vec<ExtractedRow>,
}

/// Every table in `html` that qualifies as `kind`, in document order.
pub fn extract_tables(html: &str, kind: TableKind) -> Vec<ExtractedTable> {
    let document = Html::parse_document(html);
    let mut tables = Vec::new();

    for (idx, table) in document.select(&TABLE).enumerate() {
        let headers: Vec<String> = table.select(&TH).map(cell_text).collect();
        if !qualifies(&headers, kind) {
            continue;
        }

        let rows: Vec<ExtractedRow> = table
            .select(&BODY_ROW)
            .filter_map(|tr| extract_row(tr, kind.min_cells()))
            .collect();

        debug!(table = idx, %kind, rows = rows.len(), "qualifying table");
        tables.push(ExtractedTable { headers, rows });
    }

    tables
}

/// Row cell texts of every qualifying table, merged in document order.
pub fn extract_table(html: &str, kind: TableKind) -> Vec<Vec<String>> {
    extract_tables(html, kind)
        .into_iter()
        .flat_map(|t| t.rows.into_iter().map(|r| r.cells))
        .collect()
}

fn extract_row(tr: ElementRef, min_cells: usize) -> Option<ExtractedRow> {
    let tds: Vec<ElementRef> = tr.select(&TD).collect();
    if tds.len() < min_cells {
        return None;
    }
    let cells = tds.iter().copied().map(cell_text).collect();
    let logo = tds
        .get(1)
        .and_then(|td| first_img_src(*td))
        .or_else(|| first_img_src(tr));
    Some(ExtractedRow { cells, logo })
}

fn first_img_src(el: ElementRef) -> Option<String> {
    el.select(&IMG)
        .find_map(|img| img.value().attr("src"))
        .map(str::to_string)
}

/// All descendant text with `<br>` read as a space, whitespace collapsed.
pub fn cell_text(el: ElementRef) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(t) => raw.push_str(t),
            Node::Element(e) if e.name() == "br" => raw.push(' '),
            _ => {}
        }
    }
    collapse_ws(&raw)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Rankings table as the mobile page renders it, plus an unrelated
    /// schedule table that must never be picked up.
    pub const RANKINGS_HTML: &str = r#"
<html><body>
<table class="schedule">
  <thead><tr><th>순위</th><th>시간</th><th>경기</th><th>구장</th><th>비고</th><th>중계</th></tr></thead>
  <tbody><tr><td>1</td><td>18:30</td><td>LG vs KT</td><td>잠실</td><td>-</td><td>SPO-T</td></tr></tbody>
</table>
<table class="rank">
  <thead>
    <tr><th>순위</th><th>팀</th><th>경기</th><th>승</th><th>무</th><th>패</th><th>승률</th><th>게임차</th><th>연속</th></tr>
  </thead>
  <tbody>
    <tr><td>1</td><td><img src="//img.example/lg.png">LG</td><td>132</td><td>80</td><td>2</td><td>50</td><td>0.615</td><td>-</td><td>2승</td></tr>
    <tr><td>2</td><td><img src="/emblem/hanwha.png">한화</td><td>131</td><td>76</td><td>3</td><td>52</td><td>0.594</td><td>3.0</td><td>1패</td></tr>
    <tr><td>3</td><td>SSG</td><td>130</td><td>68</td><td>4</td><td>58</td><td>0.540</td><td>10.0</td><td>3승</td></tr>
    <tr><td>4</td><td>삼성</td><td>132</td><td>68</td><td>2</td><td>62</td><td>0.523</td><td>12.0</td><td>1승</td></tr>
    <tr><td>5</td><td>NC</td><td>130</td><td>63</td><td>6</td><td>61</td><td>0.508</td><td>14.0</td><td>2승</td></tr>
    <tr><td>6</td><td>KT</td><td>131</td><td>64</td><td>4</td><td>63</td><td>0.504</td><td>14.5</td><td>1패</td></tr>
    <tr><td>7</td><td>롯데</td><td>132</td><td>63</td><td>6</td><td>63</td><td>0.500</td><td>15.0</td><td>2패</td></tr>
    <tr><td>8</td><td>KIA</td><td>130</td><td>60</td><td>4</td><td>66</td><td>0.476</td><td>18.0</td><td>1승</td></tr>
    <tr><td>9</td><td>두산</td><td>131</td><td>56</td><td>6</td><td>69</td><td>0.448</td><td>21.5</td><td>1패</td></tr>
    <tr><td>10</td><td>키움</td><td>132</td><td>45</td><td>4</td><td>83</td><td>0.352</td><td>33.0</td><td>4패</td></tr>
    <tr><td colspan="9">합계</td></tr>
  </tbody>
</table>
</body></html>
"#;

    pub const OFFENSE_HTML: &str = r#"
<table>
  <thead><tr><th>순위</th><th>팀</th><th>타율</th><th>득점</th><th>타점</th><th>홈런</th><th>볼넷</th><th>삼진</th><th>도루</th><th>출루율</th><th>장타율</th><th>OPS</th></tr></thead>
  <tbody>
    <tr><td>1</td><td>LG</td><td>0.278</td><td>700</td><td>668</td><td>110</td><td>520</td><td>900</td><td>101</td><td>0.361</td><td>0.409</td><td>0.770</td></tr>
    <tr><td>2</td><td>삼성</td><td>0.271</td><td>680</td><td>650</td><td>150</td><td>470</td><td>950</td><td>80</td><td>0.345</td><td>0.428</td><td>0.773</td></tr>
    <tr><td>2</td><td>삼성</td><td>0.271</td><td>680</td><td>650</td><td>150</td><td>470</td><td>950</td><td>80</td><td>0.345</td><td>0.428</td><td>0.773</td></tr>
  </tbody>
</table>
"#;

    pub const DEFENSE_HTML: &str = r#"
<table>
  <thead><tr><th>순위</th><th>팀</th><th>평균자책</th><th>실점</th><th>자책</th><th>이닝</th><th>피안타</th><th>피홈런</th><th>탈삼진</th><th>볼넷</th><th>홀드</th><th>세이브</th><th>WHIP</th></tr></thead>
  <tbody>
    <tr><td>1</td><td>한화</td><td>3.55</td><td>540</td><td>480</td><td>1165.2</td><td>1100</td><td>90</td><td>1150</td><td>400</td><td>80</td><td>40</td><td>1.29</td></tr>
    <tr><td>2</td><td>LG</td><td>3.80</td><td>570</td><td>510</td><td>1160.1</td><td>1120</td><td>100</td><td>1000</td><td>420</td><td>70</td><td>35</td><td>1.33</td></tr>
  </tbody>
</table>
"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn picks_only_the_rankings_table() {
        let tables = extract_tables(RANKINGS_HTML, TableKind::Rankings);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers[0], "순위");
        // The colspan total row has a single cell and is dropped.
        assert_eq!(tables[0].rows.len(), 10);
        assert_eq!(tables[0].rows[0].cells[1], "LG");
        assert_eq!(tables[0].rows[0].logo.as_deref(), Some("//img.example/lg.png"));
        assert_eq!(tables[0].rows[2].logo, None);
    }

    #[test]
    fn flat_rows_in_document_order() {
        let rows = extract_table(RANKINGS_HTML, TableKind::Rankings);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[9][1], "키움");
    }

    #[test]
    fn short_rows_are_dropped() {
        let html = r#"<table><tr><th>순위</th><th>승률</th></tr>
            <tr><td>1</td><td>LG</td><td>0.615</td></tr></table>"#;
        assert!(extract_table(html, TableKind::Rankings).is_empty());
    }

    #[test]
    fn no_qualifying_table_yields_nothing() {
        assert!(extract_table(RANKINGS_HTML, TableKind::Defense).is_empty());
        assert!(extract_table("not html at all", TableKind::Rankings).is_empty());
    }

    #[test]
    fn line_breaks_and_markup_collapse() {
        let html = r#"<table><thead><tr><th>시간</th><th>경기</th></tr></thead>
            <tbody><tr><td>18:30</td><td><b>LG</b><br>vs<br/>
            <span>KT</span></td></tr></tbody></table>"#;
        let rows = extract_table(html, TableKind::Schedule);
        assert_eq!(rows, vec![vec!["18:30".to_string(), "LG vs KT".to_string()]]);
    }

    #[test]
    fn multiple_tables_are_merged() {
        let doubled = format!("{OFFENSE_HTML}{OFFENSE_HTML}");
        let tables = extract_tables(&doubled, TableKind::Offense);
        assert_eq!(tables.len(), 2);
        assert_eq!(extract_table(&doubled, TableKind::Offense).len(), 6);
    }
}
