//! 国际专利申请号（WO 号）

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 规范化的 WO 号：`WO` + 4 位年份 + 6 位序号
///
/// 两个文本形式只要规范化结果相同，就是同一个 Identifier。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// 解析任意格式的 WO 号，不符合规范时返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = clean(raw);
        canonical_prefix(&cleaned).map(Identifier)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identifier {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if !is_valid(&raw) {
            return Err(format!("invalid WO number: {raw}"));
        }
        Identifier::parse(&raw).ok_or_else(|| format!("invalid WO number: {raw}"))
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 规范化 WO 号
///
/// 去掉空格、`/`、`-` 并转为大写；匹配 `WO\d{4}\d{6}` 时只保留规范部分，
/// 否则返回清洗后的文本。该函数是幂等的。
pub fn normalize(raw: &str) -> String {
    let cleaned = clean(raw);
    canonical_prefix(&cleaned).unwrap_or(cleaned)
}

/// 从自由文本中提取所有 WO 号（按首次出现顺序去重）
pub fn extract_identifiers(text: &str) -> Vec<Identifier> {
    let mut found: Vec<Identifier> = Vec::new();
    for cap in wo_text_regex().captures_iter(text) {
        let id = Identifier(format!("WO{}{}", &cap[1], &cap[2]));
        if !found.contains(&id) {
            found.push(id);
        }
    }
    found
}

/// 校验文本是否是合法的 WO 号书写形式
pub fn is_valid(raw: &str) -> bool {
    wo_exact_regex().is_match(&raw.trim().to_uppercase())
}

/// 从专利公开号中提取国家代码，无法识别时返回 `"Unknown"`
///
/// `"BR112012008823B8"` → `"BR"`
pub fn extract_country_code(patent_number: &str) -> String {
    let upper = patent_number.trim().to_uppercase();
    let prefix: Vec<char> = upper.chars().take(2).collect();
    if prefix.len() == 2 && prefix.iter().all(|c| c.is_ascii_alphabetic()) {
        prefix.into_iter().collect()
    } else {
        "Unknown".to_string()
    }
}

/// 清洗专利号：去掉空格、逗号、连字符并大写
pub fn clean_patent_number(patent_number: &str) -> String {
    patent_number
        .chars()
        .filter(|c| !matches!(c, ' ' | ',' | '-'))
        .collect::<String>()
        .to_uppercase()
}

fn clean(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '/' && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

fn canonical_prefix(cleaned: &str) -> Option<String> {
    wo_canonical_regex()
        .captures(cleaned)
        .map(|cap| format!("WO{}{}", &cap[1], &cap[2]))
}

fn wo_canonical_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^WO(\d{4})(\d{6})").expect("static regex"))
}

fn wo_text_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)WO[\s-]?(\d{4})[\s/-]?(\d{6})").expect("static regex"))
}

fn wo_exact_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^WO[\s-]?\d{4}[\s/-]?\d{6}$").expect("static regex"))
}
