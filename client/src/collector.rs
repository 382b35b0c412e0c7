//! Maps query results onto labeled gauge samples
//!
//! One collection runs the info query and, unless disabled, the player query.
//! A failed query is reported through `server_up` / `player_up` rather than
//! as an error, so a scrape always produces output.

use crate::network::QueryClient;
use a2s::{PlayerInfo, ServerInfo, ServerType};
use log::warn;
use std::collections::HashSet;

/// One gauge value with its label pairs
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub help: &'static str,
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl Sample {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub struct Collector {
    namespace: String,
    include_players: bool,
}

impl Collector {
    pub fn new(namespace: &str, include_players: bool) -> Self {
        Self {
            namespace: namespace.to_string(),
            include_players,
        }
    }

    /// Runs the queries and converts the results
    pub async fn collect(&self, client: &QueryClient) -> Vec<Sample> {
        let (server_info, player_info) = self.query(client).await;
        self.samples(server_info.as_ref(), player_info.as_ref())
    }

    async fn query(&self, client: &QueryClient) -> (Option<ServerInfo>, Option<PlayerInfo>) {
        let server_info = match client.query_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!("Could not query server info from {}: {}", client.server_addr(), e);
                return (None, None);
            }
        };

        // SourceTV relays never answer player queries
        if !self.include_players || server_info.server_type == ServerType::SourceTv {
            return (Some(server_info), None);
        }

        match client.query_players(server_info.profile()).await {
            Ok(players) => (Some(server_info), Some(players)),
            Err(e) => {
                warn!("Could not query player info from {}: {}", client.server_addr(), e);
                (Some(server_info), None)
            }
        }
    }

    pub fn samples(
        &self,
        server_info: Option<&ServerInfo>,
        player_info: Option<&PlayerInfo>,
    ) -> Vec<Sample> {
        let mut samples = Vec::new();

        self.push(&mut samples, "server_up", up(server_info.is_some()), Vec::new());
        if self.include_players {
            self.push(&mut samples, "player_up", up(player_info.is_some()), Vec::new());
        }

        let Some(server) = server_info else {
            return samples;
        };

        self.server_samples(&mut samples, server);
        if let Some(players) = player_info {
            self.player_samples(&mut samples, &server.name, players);
        }

        samples
    }

    fn server_samples(&self, samples: &mut Vec<Sample>, server: &ServerInfo) {
        let server_name = || vec![("server_name", server.name.clone())];
        let optional = |v: Option<u64>| v.map(|v| v.to_string()).unwrap_or_default();

        let mut info_labels = server_name();
        info_labels.extend([
            ("map", server.map.clone()),
            ("folder", server.folder.clone()),
            ("game", server.game.clone()),
            ("server_type", server.server_type.as_str().to_string()),
            ("server_os", server.server_os.as_str().to_string()),
            ("version", server.version.clone()),
            ("server_id", server.app_id.to_string()),
            ("keywords", server.extended.keywords.clone().unwrap_or_default()),
            ("server_game_id", optional(server.extended.game_id)),
            ("server_steam_id", optional(server.extended.steam_id)),
            (
                "the_ship_mode",
                server
                    .the_ship
                    .map(|t| t.mode.as_str().to_string())
                    .unwrap_or_default(),
            ),
            (
                "source_tv_name",
                server
                    .source_tv
                    .as_ref()
                    .map(|tv| tv.name.clone())
                    .unwrap_or_default(),
            ),
        ]);
        self.push(samples, "server_info", 1.0, info_labels);

        // Zero means "not reported" for these
        if server.protocol > 0 {
            self.push(samples, "server_protocol", server.protocol.into(), server_name());
        }
        self.push(samples, "server_players", server.players.into(), server_name());
        self.push(samples, "server_max_players", server.max_players.into(), server_name());
        self.push(samples, "server_bots", server.bots.into(), server_name());
        self.push(samples, "server_visibility", up(server.visibility), server_name());
        self.push(samples, "server_vac", up(server.vac), server_name());

        if let Some(port) = server.extended.port.filter(|&p| p > 0) {
            self.push(samples, "server_port", port.into(), server_name());
        }
        if let Some(tv) = server.source_tv.as_ref().filter(|tv| tv.port > 0) {
            self.push(samples, "server_source_tv_port", tv.port.into(), server_name());
        }
        if let Some(the_ship) = server.the_ship {
            let witnesses = the_ship.witnesses.into();
            self.push(samples, "server_the_ship_witnesses", witnesses, server_name());
            let duration = the_ship.duration.into();
            self.push(samples, "server_the_ship_duration", duration, server_name());
        }
    }

    fn player_samples(&self, samples: &mut Vec<Sample>, server_name: &str, info: &PlayerInfo) {
        self.push(
            samples,
            "player_count",
            info.count.into(),
            vec![("server_name", server_name.to_string())],
        );

        // Some games hand out names from a small pool, so duplicates happen
        let mut seen = HashSet::new();
        for player in info.players.iter().filter(|p| seen.insert(p.name.as_str())) {
            let labels = || {
                vec![
                    ("server_name", server_name.to_string()),
                    ("player_name", player.name.clone()),
                    ("player_index", player.index.to_string()),
                ]
            };

            self.push(samples, "player_duration", player.duration.into(), labels());
            self.push(samples, "player_score", player.score.into(), labels());

            if let Some(the_ship) = player.the_ship {
                self.push(samples, "player_the_ship_deaths", the_ship.deaths.into(), labels());
                self.push(samples, "player_the_ship_money", the_ship.money.into(), labels());
            }
        }
    }

    fn push(
        &self,
        samples: &mut Vec<Sample>,
        name: &str,
        value: f64,
        labels: Vec<(&'static str, String)>,
    ) {
        let help = help_text(name);
        let name = if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.namespace, name)
        };
        samples.push(Sample {
            name,
            help,
            labels,
            value,
        });
    }
}

fn help_text(metric: &str) -> &'static str {
    match metric {
        "server_info" => {
            "Non-numerical server info, including server_steam_id and version. \
             The value is 1, and info is in the labels."
        }
        "server_up" => "Was the last server info query successful.",
        "player_up" => "Was the last player info query successful.",
        "server_protocol" => "Protocol version used by the server.",
        "server_players" => "Number of players on the server.",
        "server_max_players" => "Maximum number of players the server reports it can hold.",
        "server_bots" => "Number of bots on the server.",
        "server_visibility" => {
            "Indicates whether the server requires a password (0 for public, 1 for private)."
        }
        "server_vac" => "Specifies whether the server uses VAC (0 for unsecured, 1 for secured).",
        "server_port" => "The server's game port number.",
        "server_source_tv_port" => "Spectator port number for SourceTV.",
        "server_the_ship_witnesses" => {
            "The number of witnesses necessary to have a player arrested in a The Ship server."
        }
        "server_the_ship_duration" => {
            "Time (in seconds) before a player is arrested while being witnessed \
             in a The Ship server."
        }
        "player_count" => "Total number of connected players.",
        "player_duration" => "Time (in seconds) player has been connected to the server.",
        "player_score" => "Player's score (usually \"frags\" or \"kills\").",
        "player_the_ship_deaths" => "Player's deaths in a The Ship server.",
        "player_the_ship_money" => "Player's money in a The Ship server.",
        _ => "",
    }
}

fn up(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

fn escape_help(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label(value: &str) -> String {
    escape_help(value).replace('"', "\\\"")
}

/// Renders samples in the text exposition format
///
/// `# HELP` and `# TYPE` lines are written once, before the first sample of
/// each metric.
pub fn render(samples: &[Sample]) -> String {
    let mut out = String::new();
    let mut described = HashSet::new();

    for sample in samples {
        if described.insert(sample.name.as_str()) {
            if !sample.help.is_empty() {
                out.push_str(&format!(
                    "# HELP {} {}\n",
                    sample.name,
                    escape_help(sample.help)
                ));
            }
            out.push_str(&format!("# TYPE {} gauge\n", sample.name));
        }

        out.push_str(&sample.name);
        if !sample.labels.is_empty() {
            let labels: Vec<String> = sample
                .labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                .collect();
            out.push_str(&format!("{{{}}}", labels.join(",")));
        }
        out.push_str(&format!(" {}\n", sample.value));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2s::{Player, SourceTvInfo, TheShipInfo, TheShipMode, TheShipPlayer};
    use assert_approx_eq::assert_approx_eq;

    fn find<'a>(samples: &'a [Sample], name: &str) -> Vec<&'a Sample> {
        samples.iter().filter(|s| s.name == name).collect()
    }

    fn server() -> ServerInfo {
        ServerInfo {
            protocol: 17,
            name: "foo".to_string(),
            map: "de_dust2".to_string(),
            players: 2,
            max_players: 16,
            vac: true,
            ..Default::default()
        }
    }

    fn player(index: u8, name: &str, score: i32) -> Player {
        Player {
            index,
            name: name.to_string(),
            score,
            duration: 12.5,
            the_ship: None,
        }
    }

    #[test]
    fn test_server_down() {
        let collector = Collector::new("a2s", true);
        let samples = collector.samples(None, None);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name, "a2s_server_up");
        assert_eq!(samples[0].value, 0.0);
        assert_eq!(samples[1].name, "a2s_player_up");
        assert_eq!(samples[1].value, 0.0);
    }

    #[test]
    fn test_player_up_omitted_when_players_skipped() {
        let collector = Collector::new("a2s", false);
        let info = server();
        let samples = collector.samples(Some(&info), None);

        assert!(find(&samples, "a2s_player_up").is_empty());
        assert_eq!(find(&samples, "a2s_server_up")[0].value, 1.0);
    }

    #[test]
    fn test_server_gauges() {
        let collector = Collector::new("a2s", true);
        let mut info = server();
        info.extended.keywords = Some("casual".to_string());
        info.extended.port = Some(27015);
        info.source_tv = Some(SourceTvInfo {
            port: 0,
            name: "tv".to_string(),
        });

        let samples = collector.samples(Some(&info), None);

        let info_sample = find(&samples, "a2s_server_info")[0];
        assert_eq!(info_sample.value, 1.0);
        assert_eq!(info_sample.label("server_name"), Some("foo"));
        assert_eq!(info_sample.label("map"), Some("de_dust2"));
        assert_eq!(info_sample.label("keywords"), Some("casual"));
        assert_eq!(info_sample.label("server_steam_id"), Some(""));
        assert_eq!(info_sample.label("source_tv_name"), Some("tv"));
        assert_eq!(info_sample.label("server_type"), Some("Unknown"));

        assert_eq!(find(&samples, "a2s_server_protocol")[0].value, 17.0);
        assert_eq!(find(&samples, "a2s_server_max_players")[0].value, 16.0);
        assert_eq!(find(&samples, "a2s_server_vac")[0].value, 1.0);
        assert_eq!(find(&samples, "a2s_server_visibility")[0].value, 0.0);
        assert_eq!(find(&samples, "a2s_server_port")[0].value, 27015.0);

        // Zero port is not reported
        assert!(find(&samples, "a2s_server_source_tv_port").is_empty());
        assert!(find(&samples, "a2s_server_the_ship_witnesses").is_empty());
    }

    #[test]
    fn test_zero_protocol_skipped() {
        let collector = Collector::new("a2s", true);
        let info = ServerInfo::default();
        let samples = collector.samples(Some(&info), None);
        assert!(find(&samples, "a2s_server_protocol").is_empty());
        assert_eq!(find(&samples, "a2s_server_players").len(), 1);
    }

    #[test]
    fn test_player_gauges_deduplicate_names() {
        let collector = Collector::new("a2s", true);
        let info = server();
        let players = PlayerInfo::new(vec![
            player(0, "jon", 4),
            player(1, "alice", -2),
            player(2, "jon", 99),
        ]);

        let samples = collector.samples(Some(&info), Some(&players));

        assert_eq!(find(&samples, "a2s_player_up")[0].value, 1.0);
        assert_eq!(find(&samples, "a2s_player_count")[0].value, 3.0);

        let scores = find(&samples, "a2s_player_score");
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].label("player_name"), Some("jon"));
        assert_eq!(scores[0].label("player_index"), Some("0"));
        assert_eq!(scores[0].value, 4.0);
        assert_eq!(scores[1].value, -2.0);

        assert_approx_eq!(find(&samples, "a2s_player_duration")[0].value, 12.5);
    }

    #[test]
    fn test_the_ship_gauges() {
        let collector = Collector::new("", true);
        let mut info = server();
        info.app_id = a2s::THE_SHIP_APP_ID;
        info.the_ship = Some(TheShipInfo {
            mode: TheShipMode::Duel,
            witnesses: 3,
            duration: 45,
        });
        let mut jon = player(0, "jon", 4);
        jon.the_ship = Some(TheShipPlayer {
            deaths: 23,
            money: 3456,
        });
        let players = PlayerInfo::new(vec![jon]);

        let samples = collector.samples(Some(&info), Some(&players));

        assert_eq!(find(&samples, "server_info")[0].label("the_ship_mode"), Some("Duel"));
        assert_eq!(find(&samples, "server_the_ship_witnesses")[0].value, 3.0);
        assert_eq!(find(&samples, "server_the_ship_duration")[0].value, 45.0);
        assert_eq!(find(&samples, "player_the_ship_deaths")[0].value, 23.0);
        assert_eq!(find(&samples, "player_the_ship_money")[0].value, 3456.0);
    }

    /// Every gauge carries its help text, namespaced or not
    #[test]
    fn test_every_gauge_has_help() {
        let collector = Collector::new("a2s", true);
        let mut info = server();
        info.extended.port = Some(27015);
        info.the_ship = Some(TheShipInfo::default());
        let mut jon = player(0, "jon", 4);
        jon.the_ship = Some(TheShipPlayer::default());
        let players = PlayerInfo::new(vec![jon]);

        let samples = collector.samples(Some(&info), Some(&players));
        for sample in &samples {
            assert!(!sample.help.is_empty(), "{} has no help text", sample.name);
        }
        assert_eq!(
            find(&samples, "a2s_server_players")[0].help,
            "Number of players on the server."
        );
    }

    /// Help and type lines precede the first sample of each metric only
    #[test]
    fn test_render() {
        let samples = vec![
            Sample {
                name: "a2s_server_up".to_string(),
                help: "Was the last server info query successful.",
                labels: Vec::new(),
                value: 1.0,
            },
            Sample {
                name: "a2s_player_score".to_string(),
                help: "Player's score.",
                labels: vec![("player_name", "say \"hi\"\\".to_string())],
                value: 4.0,
            },
            Sample {
                name: "a2s_player_score".to_string(),
                help: "Player's score.",
                labels: vec![("player_name", "bob".to_string())],
                value: -1.5,
            },
        ];

        assert_eq!(
            render(&samples),
            "# HELP a2s_server_up Was the last server info query successful.\n\
             # TYPE a2s_server_up gauge\n\
             a2s_server_up 1\n\
             # HELP a2s_player_score Player's score.\n\
             # TYPE a2s_player_score gauge\n\
             a2s_player_score{player_name=\"say \\\"hi\\\"\\\\\"} 4\n\
             a2s_player_score{player_name=\"bob\"} -1.5\n"
        );
    }
}
