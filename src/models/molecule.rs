use serde::{Deserialize, Serialize};

/// 化学参考库中的分子信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoleculeProfile {
    pub molecule_name: String,
    /// 研发代号（如 ODM-201）
    pub dev_codes: Vec<String>,
    /// CAS 登记号
    pub cas_number: Option<String>,
    pub synonyms: Vec<String>,
    pub molecular_formula: String,
    pub smiles: String,
    /// 本次解析发出的请求数
    #[serde(skip)]
    pub lookups: usize,
}

impl MoleculeProfile {
    pub fn empty(molecule_name: impl Into<String>) -> Self {
        Self {
            molecule_name: molecule_name.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty() && self.dev_codes.is_empty() && self.cas_number.is_none()
    }
}
