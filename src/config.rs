use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

/// Optional JSON configuration; every field is optional and only fills in
/// what the command line and environment leave unset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: Option<PathBuf>, // None => 使用默认台账路径
    #[serde(default)]
    pub backup: Option<bool>, // None => 保存前创建备份
}

pub fn load_config(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).with_context(|| format!("读取配置失败: {}", path.display()))?;
    let cfg: Config = serde_json::from_str(&text).context("配置 JSON 解析失败")?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_fields_optional() {
        let cfg: Config = serde_json::from_str("{}").expect("parse");
        assert!(cfg.ledger.is_none());
        assert!(cfg.backup.is_none());

        let cfg: Config =
            serde_json::from_str(r#"{"ledger": "Finance/台账.xlsx", "backup": false}"#)
                .expect("parse");
        assert_eq!(cfg.ledger, Some(PathBuf::from("Finance/台账.xlsx")));
        assert_eq!(cfg.backup, Some(false));
    }
}
