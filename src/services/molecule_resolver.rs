//! 分子解析服务 - 业务能力层
//!
//! 从化学参考库中取得同义词，并从中识别研发代号和 CAS 号。
//! 解析永远不会失败：任何异常都返回空的 `MoleculeProfile`。

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::clients::PubChemClient;
use crate::models::MoleculeProfile;

const MAX_DEV_CODES: usize = 20;
const MAX_SYNONYMS: usize = 50;

/// 分子解析能力
#[async_trait]
pub trait MoleculeLookup: Send + Sync {
    async fn resolve(&self, molecule_name: &str) -> MoleculeProfile;
}

/// 基于 PubChem 的分子解析服务
pub struct MoleculeResolver {
    client: PubChemClient,
}

impl MoleculeResolver {
    pub fn new(client: PubChemClient) -> Self {
        Self { client }
    }

    async fn property(&self, molecule_name: &str, property: &str) -> String {
        match self.client.property(molecule_name, property).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("  ⚠️ PubChem 属性 {} 查询失败: {}", property, e);
                String::new()
            }
        }
    }
}

#[async_trait]
impl MoleculeLookup for MoleculeResolver {
    async fn resolve(&self, molecule_name: &str) -> MoleculeProfile {
        info!("🔍 查询 PubChem: {}", molecule_name);

        let synonyms = match self.client.synonyms(molecule_name).await {
            Ok(Some(synonyms)) => synonyms,
            Ok(None) => {
                warn!("  ⚠️ PubChem 未返回同义词: {}", molecule_name);
                return MoleculeProfile {
                    lookups: 1,
                    ..MoleculeProfile::empty(molecule_name)
                };
            }
            Err(e) => {
                warn!("  ⚠️ PubChem 查询失败: {}", e);
                return MoleculeProfile {
                    lookups: 1,
                    ..MoleculeProfile::empty(molecule_name)
                };
            }
        };

        let dev_codes = extract_dev_codes(&synonyms);
        let cas_number = extract_cas_number(&synonyms);
        info!(
            "  ✅ 研发代号 {} 个, CAS: {}",
            dev_codes.len(),
            cas_number.as_deref().unwrap_or("N/A")
        );

        MoleculeProfile {
            molecule_name: molecule_name.to_string(),
            dev_codes,
            cas_number,
            synonyms: filter_synonyms(&synonyms),
            molecular_formula: self.property(molecule_name, "MolecularFormula").await,
            smiles: self.property(molecule_name, "CanonicalSMILES").await,
            lookups: 3,
        }
    }
}

/// 研发代号（如 `ODM-201`、`ARN 509`），去重，最多 20 个
pub fn extract_dev_codes(synonyms: &[String]) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)^[A-Z]{2,5}[-\s]?\d{3,7}[A-Z]?$").expect("static regex")
    });

    let mut codes: Vec<String> = Vec::new();
    for synonym in synonyms.iter().map(|s| s.trim()) {
        if codes.len() >= MAX_DEV_CODES {
            break;
        }
        if re.is_match(synonym) && !codes.iter().any(|c| c == synonym) {
            codes.push(synonym.to_string());
        }
    }
    codes
}

/// 第一个形如 `1297538-32-9` 的同义词
pub fn extract_cas_number(synonyms: &[String]) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\d{2,7}-\d{2}-\d$").expect("static regex"));
    synonyms.iter().find(|s| re.is_match(s)).cloned()
}

/// 长度 3..=100、忽略大小写去重、去掉 `CID` 开头，最多 50 个
pub fn filter_synonyms(synonyms: &[String]) -> Vec<String> {
    let mut filtered: Vec<String> = Vec::new();
    for synonym in synonyms.iter().map(|s| s.trim()) {
        let len = synonym.chars().count();
        if !(3..=100).contains(&len) || synonym.starts_with("CID") {
            continue;
        }
        let lower = synonym.to_lowercase();
        if filtered.iter().any(|s| s.to_lowercase() == lower) {
            continue;
        }
        filtered.push(synonym.to_string());
        if filtered.len() >= MAX_SYNONYMS {
            break;
        }
    }
    filtered
}
