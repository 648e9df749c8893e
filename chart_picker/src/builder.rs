pub use crate::config::*;

/// A builder for the settings of a session.
///
/// Charts and players added without an id get a generated one.
///
/// ```
/// pub use chart_picker::builder::Builder;
/// # use chart_picker::PickerError;
///
/// let mut builder = Builder::new(6, 4)
///     .players(&["Anna".to_string(), "Bob".to_string()]);
///
/// builder.add_chart_simple(11, "Loituma");
/// builder.add_chart_simple(12, "Loituma ~Hyper Mix~");
///
/// let settings = builder.required_difficulties(&[12]).build()?;
/// assert_eq!(settings.players[0].player_id, "player-00000001");
///
/// # Ok::<(), PickerError>(())
/// ```
pub struct Builder {
    pub(crate) _settings: Settings,
}

impl Builder {
    pub fn new(how_many_charts_to_vote_from: usize, how_many_charts_to_randomize: usize) -> Builder {
        Builder {
            _settings: Settings {
                charts: Vec::new(),
                players: Vec::new(),
                how_many_charts_to_vote_from,
                how_many_charts_to_randomize,
                required_difficulties: Vec::new(),
                weight_rule: WeightRule::default(),
            },
        }
    }

    /// Replaces the players, in turn order.
    pub fn players(mut self, names: &[String]) -> Builder {
        self._settings.players = Vec::new();
        for name in names {
            self.add_player_simple(name);
        }
        self
    }

    pub fn charts(mut self, charts: &[Chart]) -> Builder {
        self._settings.charts = charts.to_vec();
        self
    }

    pub fn required_difficulties(mut self, difficulties: &[u32]) -> Builder {
        self._settings.required_difficulties = difficulties.to_vec();
        self
    }

    pub fn weight_rule(mut self, rule: WeightRule) -> Builder {
        self._settings.weight_rule = rule;
        self
    }

    /// Adds a player at the end of the turn order, returns its generated id.
    pub fn add_player_simple(&mut self, name: &str) -> String {
        let player_id = format!("player-{:08}", self._settings.players.len() + 1);
        self.add_player(&Player {
            player_id: player_id.clone(),
            name: name.to_string(),
        });
        player_id
    }

    pub fn add_player(&mut self, player: &Player) {
        self._settings.players.push(player.clone());
    }

    /// Adds a chart without subtitle, returns its generated id.
    pub fn add_chart_simple(&mut self, difficulty_rating: u32, title: &str) -> String {
        let chart_id = format!("chart-{:08}", self._settings.charts.len() + 1);
        self.add_chart(&Chart {
            chart_id: chart_id.clone(),
            difficulty_rating,
            title: title.to_string(),
            subtitle: None,
        });
        chart_id
    }

    pub fn add_chart(&mut self, chart: &Chart) {
        self._settings.charts.push(chart.clone());
    }

    /// Checks the settings the same way starting a session does.
    pub fn build(self) -> Result<Settings, PickerError> {
        crate::validate_settings(&self._settings)
            .map_err(|source| PickerError::Configuration { source })?;
        Ok(self._settings)
    }
}
