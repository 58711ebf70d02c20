/// PubChem PUG REST 客户端
///
/// 只负责原始调用，解析研发代号、CAS 号等由 `MoleculeResolver` 完成
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, AppError, AppResult, InitError};

#[derive(Debug, Default, Deserialize)]
struct SynonymsResponse {
    #[serde(rename = "InformationList")]
    information_list: Option<InformationList>,
}

#[derive(Debug, Default, Deserialize)]
struct InformationList {
    #[serde(rename = "Information", default)]
    information: Vec<Information>,
}

#[derive(Debug, Default, Deserialize)]
struct Information {
    #[serde(rename = "Synonym", default)]
    synonym: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertyResponse {
    #[serde(rename = "PropertyTable")]
    property_table: Option<PropertyTable>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// PubChem 客户端
#[derive(Clone)]
pub struct PubChemClient {
    http: Client,
    base_url: String,
}

impl PubChemClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InitError::HttpClient {
                client: "pubchem".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 查询同义词列表
    ///
    /// # 返回
    /// 响应中没有 `InformationList` 时返回 `None`
    pub async fn synonyms(&self, molecule: &str) -> AppResult<Option<Vec<String>>> {
        let url = self.compound_url(molecule, &["synonyms", "JSON"])?;
        let body: SynonymsResponse = self.get_json(url).await?;
        Ok(body
            .information_list
            .and_then(|list| list.information.into_iter().next())
            .map(|info| info.synonym))
    }

    /// 查询单个属性（如 `MolecularFormula`、`CanonicalSMILES`）
    pub async fn property(&self, molecule: &str, property: &str) -> AppResult<Option<String>> {
        let url = self.compound_url(molecule, &["property", property, "JSON"])?;
        let body: PropertyResponse = self.get_json(url).await?;
        let value = body
            .property_table
            .and_then(|table| table.properties.into_iter().next())
            .and_then(|props| props.get(property).and_then(|v| v.as_str()).map(str::to_string));
        Ok(value)
    }

    fn compound_url(&self, molecule: &str, tail: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Other(format!("PubChem 地址无效 {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Other(format!("PubChem 地址无效 {}", self.base_url)))?
            .pop_if_empty()
            .extend(["compound", "name", molecule])
            .extend(tail);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> AppResult<T> {
        let endpoint = url.path().to_string();
        debug!("PubChem 请求: {}", endpoint);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint,
                status: status.as_u16(),
            }
            .into());
        }

        response.json::<T>().await.map_err(|e| {
            ApiError::JsonParseFailed {
                source: Box::new(e),
            }
            .into()
        })
    }
}
