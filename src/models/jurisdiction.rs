use phf::phf_map;

/// 国家/地区代码 → 名称
static JURISDICTION_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "BR" => "Brazil",
    "US" => "United States",
    "EP" => "Europe",
    "CN" => "China",
    "JP" => "Japan",
    "CA" => "Canada",
    "AU" => "Australia",
    "KR" => "South Korea",
    "IN" => "India",
    "MX" => "Mexico",
    "AR" => "Argentina",
    "CL" => "Chile",
    "DE" => "Germany",
    "FR" => "France",
    "GB" => "United Kingdom",
    "IT" => "Italy",
    "ES" => "Spain",
    "RU" => "Russia",
    "WO" => "WIPO",
};

/// 区域注册库覆盖的辖区
pub const REGIONAL_JURISDICTION: &str = "BR";

/// 获取辖区名称，未知代码原样返回
pub fn jurisdiction_name(code: &str) -> String {
    let upper = code.to_uppercase();
    JURISDICTION_NAMES
        .get(upper.as_str())
        .map(|name| name.to_string())
        .unwrap_or(upper)
}

/// 是否像一个两位字母的国家代码
pub fn looks_like_country_code(text: &str) -> bool {
    let text = text.trim();
    text.len() == 2 && text.chars().all(|c| c.is_ascii_alphabetic())
}
