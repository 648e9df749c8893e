use crate::session::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChartSource {
    /// `text` or `xlsx`
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(rename = "howManyChartsToVoteFrom")]
    pub how_many_charts_to_vote_from: Option<usize>,
    #[serde(rename = "howManyChartsToRandomize")]
    pub how_many_charts_to_randomize: Option<usize>,
    #[serde(rename = "requiredDifficulties")]
    pub required_difficulties: Option<Vec<u32>>,
    #[serde(rename = "weightRule")]
    _weight_rule: Option<String>,
    #[serde(rename = "randomSeed")]
    _random_seed: Option<JSValue>,
    pub charts: Option<Vec<Chart>>,
    pub players: Option<Vec<Player>>,
    #[serde(rename = "chartSources")]
    pub chart_sources: Option<Vec<ChartSource>>,
    #[serde(rename = "playerSources")]
    pub player_sources: Option<Vec<PlayerSource>>,
}

impl SessionConfig {
    pub fn weight_rule(&self) -> SessionResult<Option<WeightRule>> {
        self._weight_rule
            .as_deref()
            .map(parse_weight_rule)
            .transpose()
    }

    /// The seed may be written as a number or as a string.
    pub fn random_seed(&self) -> SessionResult<Option<u64>> {
        match &self._random_seed {
            None | Some(JSValue::Null) => Ok(None),
            Some(JSValue::Number(n)) => match n.as_u64() {
                Some(x) => Ok(Some(x)),
                None => whatever!("randomSeed must be a non-negative integer: {}", n),
            },
            Some(JSValue::String(s)) => match s.parse::<u64>() {
                Ok(x) => Ok(Some(x)),
                Err(_) => whatever!("randomSeed must be a non-negative integer: {:?}", s),
            },
            Some(x) => whatever!("randomSeed must be a non-negative integer: {}", x),
        }
    }
}

pub fn parse_weight_rule(s: &str) -> SessionResult<WeightRule> {
    match s {
        "exponential" => Ok(WeightRule::Exponential),
        "linear" => Ok(WeightRule::Linear),
        _ => whatever!("unknown weight rule: {}", s),
    }
}

pub fn read_session_config(path: &str) -> SessionResult<SessionConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: SessionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_session_config: {:?}", config);
    Ok(config)
}
