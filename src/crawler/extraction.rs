//! 门户页面抽取策略
//!
//! 每个字段对应一个有序的纯函数列表，按顺序尝试，第一个返回非空文本的策略胜出。
//! 所有策略只依赖 HTML 文本，可以脱离浏览器单独测试。

use scraper::{ElementRef, Html, Selector};

use crate::models::filing::{ExtractFailure, ExtractionDiagnostics, FilingApplication};
use crate::models::jurisdiction::looks_like_country_code;

/// 摘要最大长度（字符）
pub const ABSTRACT_MAX_CHARS: usize = 500;

/// 单个抽取策略
#[derive(Clone, Copy)]
pub struct FieldStrategy {
    pub name: &'static str,
    pub extract: fn(&Html) -> Option<String>,
}

impl std::fmt::Debug for FieldStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldStrategy").field("name", &self.name).finish()
    }
}

/// 策略命中结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHit {
    pub value: String,
    pub strategy: &'static str,
}

/// 门户书目字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalField {
    Title,
    Abstract,
    Applicant,
    FilingDate,
    PublicationDate,
    PriorityDate,
}

impl PortalField {
    pub const ALL: [PortalField; 6] = [
        PortalField::Title,
        PortalField::Abstract,
        PortalField::Applicant,
        PortalField::FilingDate,
        PortalField::PublicationDate,
        PortalField::PriorityDate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PortalField::Title => "title",
            PortalField::Abstract => "abstract",
            PortalField::Applicant => "applicant",
            PortalField::FilingDate => "filing_date",
            PortalField::PublicationDate => "publication_date",
            PortalField::PriorityDate => "priority_date",
        }
    }

    pub fn strategies(self) -> &'static [FieldStrategy] {
        match self {
            PortalField::Title => TITLE_STRATEGIES,
            PortalField::Abstract => ABSTRACT_STRATEGIES,
            PortalField::Applicant => APPLICANT_STRATEGIES,
            PortalField::FilingDate => FILING_DATE_STRATEGIES,
            PortalField::PublicationDate => PUBLICATION_DATE_STRATEGIES,
            PortalField::PriorityDate => PRIORITY_DATE_STRATEGIES,
        }
    }
}

pub static TITLE_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy {
        name: "h3.tab_title",
        extract: |doc: &Html| first_text(doc, "h3.tab_title"),
    },
    FieldStrategy {
        name: "div.title",
        extract: |doc: &Html| first_text(doc, "div.title"),
    },
    FieldStrategy {
        name: "h1.patent-title",
        extract: |doc: &Html| first_text(doc, "h1.patent-title"),
    },
];

pub static ABSTRACT_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy {
        name: "div.abstract",
        extract: |doc: &Html| first_text(doc, "div.abstract"),
    },
    FieldStrategy {
        name: "div#abstract",
        extract: |doc: &Html| first_text(doc, "div#abstract"),
    },
    FieldStrategy {
        name: "p.abstract-text",
        extract: |doc: &Html| first_text(doc, "p.abstract-text"),
    },
];

pub static APPLICANT_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy {
        name: "td:Applicant",
        extract: |doc: &Html| labelled_cell(doc, "Applicant"),
    },
    FieldStrategy {
        name: "td:Applicants",
        extract: |doc: &Html| labelled_cell(doc, "Applicants"),
    },
    FieldStrategy {
        name: ".applicantData",
        extract: |doc: &Html| first_text(doc, ".applicantData"),
    },
];

pub static FILING_DATE_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy {
        name: "tr:Filing Date",
        extract: |doc: &Html| date_row(doc, "Filing Date"),
    },
    FieldStrategy {
        name: "tr:Application Date",
        extract: |doc: &Html| date_row(doc, "Application Date"),
    },
];

pub static PUBLICATION_DATE_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy {
        name: "tr:Publication Date",
        extract: |doc: &Html| date_row(doc, "Publication Date"),
    },
    FieldStrategy {
        name: "tr:International Publication Date",
        extract: |doc: &Html| date_row(doc, "International Publication Date"),
    },
];

pub static PRIORITY_DATE_STRATEGIES: &[FieldStrategy] = &[FieldStrategy {
    name: "tr:Priority Date",
    extract: |doc: &Html| date_row(doc, "Priority Date"),
}];

/// 国家阶段表的行选择器，第一个匹配到多于一行的选择器胜出
pub static TABLE_ROW_SELECTORS: &[&str] = &[
    "table.national-phase-table tr",
    "div.national-phase tr",
    "table tr",
];

/// 按顺序尝试策略
pub fn extract_field(
    doc: &Html,
    field: &str,
    strategies: &[FieldStrategy],
) -> Result<FieldHit, ExtractFailure> {
    strategies
        .iter()
        .find_map(|strategy| {
            (strategy.extract)(doc)
                .filter(|value| !value.is_empty())
                .map(|value| FieldHit {
                    value,
                    strategy: strategy.name,
                })
        })
        .ok_or_else(|| ExtractFailure::NoMatch {
            field: field.to_string(),
            tried: strategies.len(),
        })
}

/// 书目字段抽取结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bibliographic {
    pub title: String,
    pub abstract_text: String,
    pub applicant: String,
    pub filing_date: String,
    pub publication_date: String,
    pub priority_date: String,
}

impl Bibliographic {
    fn slot_mut(&mut self, field: PortalField) -> &mut String {
        match field {
            PortalField::Title => &mut self.title,
            PortalField::Abstract => &mut self.abstract_text,
            PortalField::Applicant => &mut self.applicant,
            PortalField::FilingDate => &mut self.filing_date,
            PortalField::PublicationDate => &mut self.publication_date,
            PortalField::PriorityDate => &mut self.priority_date,
        }
    }
}

/// 抽取全部书目字段，命中与失败都记录到诊断信息中
pub fn extract_bibliographic(doc: &Html, diagnostics: &mut ExtractionDiagnostics) -> Bibliographic {
    let mut biblio = Bibliographic::default();
    for field in PortalField::ALL {
        match extract_field(doc, field.name(), field.strategies()) {
            Ok(hit) => {
                diagnostics
                    .strategies_hit
                    .push(format!("{}:{}", field.name(), hit.strategy));
                *biblio.slot_mut(field) = hit.value;
            }
            Err(failure) => diagnostics.field_failures.push(failure),
        }
    }
    biblio.abstract_text = truncate_chars(&biblio.abstract_text, ABSTRACT_MAX_CHARS);
    biblio
}

/// 国家阶段表抽取结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableExtraction {
    pub applications: Vec<FilingApplication>,
    pub selector: Option<&'static str>,
    pub failures: Vec<ExtractFailure>,
}

/// 抽取国家阶段表
///
/// 跳过表头行、少于 3 个单元格的行以及国家列不是两位字母代码的行。
/// 单元格顺序：日期、国家、申请号、状态。
pub fn extract_applications(doc: &Html) -> TableExtraction {
    extract_applications_with(doc, TABLE_ROW_SELECTORS)
}

pub fn extract_applications_with(doc: &Html, selectors: &[&'static str]) -> TableExtraction {
    let mut out = TableExtraction::default();
    let Ok(cell_selector) = Selector::parse("td") else {
        return out;
    };

    for css in selectors {
        let selector = match Selector::parse(css) {
            Ok(selector) => selector,
            Err(_) => {
                out.failures.push(ExtractFailure::InvalidSelector {
                    selector: css.to_string(),
                });
                continue;
            }
        };
        let rows: Vec<ElementRef> = doc.select(&selector).collect();
        if rows.len() <= 1 {
            continue;
        }

        out.selector = Some(*css);
        out.applications = rows
            .iter()
            .skip(1)
            .filter_map(|row| parse_row(row, &cell_selector))
            .collect();
        return out;
    }

    out.failures.push(ExtractFailure::NoMatch {
        field: "national_phase".to_string(),
        tried: selectors.len(),
    });
    out
}

fn parse_row(row: &ElementRef, cell_selector: &Selector) -> Option<FilingApplication> {
    let cells: Vec<String> = row.select(cell_selector).map(|c| element_text(&c)).collect();
    if cells.len() < 3 {
        return None;
    }
    let country_code = cells[1].trim().to_uppercase();
    if !looks_like_country_code(&country_code) {
        return None;
    }
    Some(FilingApplication {
        country_code,
        application_number: cells[2].clone(),
        filing_date: cells[0].clone(),
        status: cells.get(3).cloned().unwrap_or_default(),
    })
}

// ========== 选择器辅助函数 ==========

/// 第一个文本非空的匹配元素
fn first_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

/// 标签为 `label` 的 `td` 之后紧邻的 `td`
fn labelled_cell(doc: &Html, label: &str) -> Option<String> {
    let selector = Selector::parse("td").ok()?;
    doc.select(&selector)
        .filter(|cell| {
            let text = element_text(cell);
            text.trim_end_matches(':').eq_ignore_ascii_case(label)
        })
        .find_map(|cell| {
            cell.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| sibling.value().name() == "td")
                .map(|sibling| element_text(&sibling))
                .filter(|text| !text.is_empty())
        })
}

/// 包含 `label` 的行中第二个单元格的前 10 个字符
fn date_row(doc: &Html, label: &str) -> Option<String> {
    let rows = Selector::parse("tr").ok()?;
    let cells = Selector::parse("td, th").ok()?;
    doc.select(&rows)
        .filter(|row| row_label(row, &cells).is_some_and(|first| first.contains(label)))
        .find_map(|row| {
            row.select(&cells)
                .nth(1)
                .map(|cell| truncate_chars(&element_text(&cell), 10))
                .filter(|text| !text.is_empty())
        })
}

fn row_label(row: &ElementRef, cells: &Selector) -> Option<String> {
    row.select(cells).next().map(|cell| element_text(&cell))
}

/// 元素文本（合并空白）
fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
