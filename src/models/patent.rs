//! 合并后的专利记录与字段填充规则
//!
//! 填充规则：按阶段顺序（门户 → 详情 → 区域注册库），字段由第一个给出非空值的
//! 来源填充；后来的来源不会覆盖已填充的字段。区域注册库只允许回填标题和申请人。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::enrichment::{DetailsResult, RegistryResult};
use super::filing::FilingApplication;
use super::identifier::{clean_patent_number, Identifier};
use super::jurisdiction::jurisdiction_name;

/// 数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// WIPO 门户（国家阶段表）
    Portal,
    /// 详情接口
    Details,
    /// 区域注册库
    Regional,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Portal => "portal",
            DataSource::Details => "details",
            DataSource::Regional => "regional",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 可填充的文本字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatentField {
    PriorityDate,
    FilingDate,
    PublicationDate,
    GrantDate,
    Title,
    Abstract,
    Claims,
    Assignee,
    LegalStatus,
    FamilyId,
    SourceUrl,
    PdfUrl,
}

impl PatentField {
    pub fn name(self) -> &'static str {
        match self {
            PatentField::PriorityDate => "priority_date",
            PatentField::FilingDate => "filing_date",
            PatentField::PublicationDate => "publication_date",
            PatentField::GrantDate => "grant_date",
            PatentField::Title => "title",
            PatentField::Abstract => "abstract",
            PatentField::Claims => "claims",
            PatentField::Assignee => "assignee",
            PatentField::LegalStatus => "legal_status",
            PatentField::FamilyId => "family_id",
            PatentField::SourceUrl => "source_url",
            PatentField::PdfUrl => "pdf_url",
        }
    }
}

/// 报告中的一条专利
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatentRecord {
    pub publication_number: String,
    pub country_code: String,
    pub jurisdiction: String,
    pub jurisdiction_name: String,

    pub priority_date: String,
    pub filing_date: String,
    pub publication_date: String,
    pub grant_date: String,

    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub claims: String,

    pub assignee: String,
    pub inventors: Vec<String>,

    pub legal_status: String,

    pub family_id: String,
    pub family_size: Option<u32>,
    /// 所属 WO 号
    pub source_identifier: String,

    pub cpc_classifications: Vec<String>,
    pub ipc_classifications: Vec<String>,

    pub source_url: String,
    pub pdf_url: String,

    pub regional_enriched: bool,
    pub regional_status: String,
    pub regional_process_number: String,

    /// 字段 → 来源
    pub provenance: BTreeMap<String, DataSource>,
}

impl PatentRecord {
    /// 以国家阶段申请为起点创建记录（门户阶段）
    pub fn from_application(app: &FilingApplication, identifier: Option<&Identifier>) -> Self {
        let publication_number = clean_patent_number(&app.application_number);
        let country_code = app.country_code.trim().to_uppercase();
        let mut record = Self {
            publication_number,
            jurisdiction_name: jurisdiction_name(&country_code),
            jurisdiction: country_code.clone(),
            country_code,
            ..Default::default()
        };
        record.fill(PatentField::FilingDate, &app.filing_date, DataSource::Portal);
        record.fill(PatentField::LegalStatus, &app.status, DataSource::Portal);
        if let Some(id) = identifier {
            record.source_identifier = id.to_string();
            record
                .provenance
                .insert("source_identifier".to_string(), DataSource::Portal);
        }
        record
    }

    /// 字段为空且新值非空时填充，返回是否填充
    pub fn fill(&mut self, field: PatentField, value: &str, source: DataSource) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        let slot = self.slot_mut(field);
        if !slot.is_empty() {
            return false;
        }
        *slot = value.to_string();
        self.provenance.insert(field.name().to_string(), source);
        true
    }

    pub fn get(&self, field: PatentField) -> &str {
        match field {
            PatentField::PriorityDate => &self.priority_date,
            PatentField::FilingDate => &self.filing_date,
            PatentField::PublicationDate => &self.publication_date,
            PatentField::GrantDate => &self.grant_date,
            PatentField::Title => &self.title,
            PatentField::Abstract => &self.abstract_text,
            PatentField::Claims => &self.claims,
            PatentField::Assignee => &self.assignee,
            PatentField::LegalStatus => &self.legal_status,
            PatentField::FamilyId => &self.family_id,
            PatentField::SourceUrl => &self.source_url,
            PatentField::PdfUrl => &self.pdf_url,
        }
    }

    fn slot_mut(&mut self, field: PatentField) -> &mut String {
        match field {
            PatentField::PriorityDate => &mut self.priority_date,
            PatentField::FilingDate => &mut self.filing_date,
            PatentField::PublicationDate => &mut self.publication_date,
            PatentField::GrantDate => &mut self.grant_date,
            PatentField::Title => &mut self.title,
            PatentField::Abstract => &mut self.abstract_text,
            PatentField::Claims => &mut self.claims,
            PatentField::Assignee => &mut self.assignee,
            PatentField::LegalStatus => &mut self.legal_status,
            PatentField::FamilyId => &mut self.family_id,
            PatentField::SourceUrl => &mut self.source_url,
            PatentField::PdfUrl => &mut self.pdf_url,
        }
    }

    /// 合并详情接口数据（详情阶段）
    pub fn apply_details(&mut self, details: &DetailsResult) {
        let source = DataSource::Details;
        self.fill(PatentField::PriorityDate, &details.priority_date, source);
        self.fill(PatentField::FilingDate, &details.filing_date, source);
        self.fill(PatentField::PublicationDate, &details.publication_date, source);
        self.fill(PatentField::GrantDate, &details.grant_date, source);
        self.fill(PatentField::Title, &details.title, source);
        self.fill(PatentField::Abstract, &details.abstract_text, source);
        self.fill(PatentField::Claims, &details.claims, source);
        self.fill(PatentField::Assignee, &details.assignee, source);
        self.fill(PatentField::LegalStatus, &details.legal_status, source);
        self.fill(PatentField::FamilyId, &details.family_id, source);
        self.fill(PatentField::SourceUrl, &details.url, source);
        self.fill(PatentField::PdfUrl, &details.pdf_url, source);

        if self.inventors.is_empty() && !details.inventors.is_empty() {
            self.inventors = details.inventors.clone();
            self.provenance.insert("inventors".to_string(), source);
        }
        if self.cpc_classifications.is_empty() && !details.cpc_classifications.is_empty() {
            self.cpc_classifications = details.cpc_classifications.clone();
            self.provenance
                .insert("cpc_classifications".to_string(), source);
        }
        if self.ipc_classifications.is_empty() && !details.ipc_classifications.is_empty() {
            self.ipc_classifications = details.ipc_classifications.clone();
            self.provenance
                .insert("ipc_classifications".to_string(), source);
        }
        if self.family_size.is_none() {
            if let Some(size) = details.family_size.filter(|s| *s > 0) {
                self.family_size = Some(size);
                self.provenance.insert("family_size".to_string(), source);
            }
        }
    }

    /// 合并区域注册库数据（仅在找到记录时标记为已补充，只回填标题和申请人）
    pub fn apply_registry(&mut self, registry: &RegistryResult) -> bool {
        if !registry.found {
            return false;
        }
        let source = DataSource::Regional;
        self.regional_enriched = true;
        self.regional_status = registry.status.clone();
        self.regional_process_number = registry.process_number.clone();
        self.provenance.insert("regional_status".to_string(), source);
        self.fill(PatentField::Title, &registry.title, source);
        self.fill(PatentField::Assignee, &registry.applicant, source);
        true
    }

    /// 该字段是由哪个来源填充的
    pub fn source_of(&self, field: PatentField) -> Option<DataSource> {
        self.provenance.get(field.name()).copied()
    }
}
