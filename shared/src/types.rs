//! Server and player records carried by A2S responses
//!
//! The optional parts of the info response are modelled explicitly: the
//! extended fields are individually optional and their presence drives the
//! Extra Data Flags byte, SourceTV and The Ship blocks are `Option`s, and The
//! Ship handling keys off a [`GameProfile`] derived from the app id.

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Reserved Steam app id of The Ship
pub const THE_SHIP_APP_ID: u16 = 2400;

/// Selects the game-specific payload layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameProfile {
    #[default]
    Standard,
    TheShip,
}

impl GameProfile {
    pub fn from_app_id(app_id: u16) -> Self {
        if app_id == THE_SHIP_APP_ID {
            GameProfile::TheShip
        } else {
            GameProfile::Standard
        }
    }

    pub fn is_the_ship(self) -> bool {
        self == GameProfile::TheShip
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServerType {
    #[default]
    Unknown,
    Dedicated,
    NonDedicated,
    SourceTv,
}

impl ServerType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'd' | b'D' => ServerType::Dedicated,
            b'l' | b'L' => ServerType::NonDedicated,
            b'p' | b'P' => ServerType::SourceTv,
            _ => ServerType::Unknown,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ServerType::Dedicated => b'd',
            ServerType::NonDedicated => b'l',
            ServerType::SourceTv => b'p',
            ServerType::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServerType::Dedicated => "Dedicated",
            ServerType::NonDedicated => "Non-Dedicated",
            ServerType::SourceTv => "SourceTV",
            ServerType::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServerOs {
    #[default]
    Unknown,
    Linux,
    Windows,
    Mac,
}

impl ServerOs {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'l' | b'L' => ServerOs::Linux,
            b'w' | b'W' => ServerOs::Windows,
            b'm' | b'M' | b'o' | b'O' => ServerOs::Mac,
            _ => ServerOs::Unknown,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ServerOs::Linux => b'l',
            ServerOs::Windows => b'w',
            ServerOs::Mac => b'm',
            ServerOs::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServerOs::Linux => "Linux",
            ServerOs::Windows => "Windows",
            ServerOs::Mac => "Mac",
            ServerOs::Unknown => "Unknown",
        }
    }
}

/// Game mode of a The Ship server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TheShipMode {
    #[default]
    Hunt,
    Elimination,
    Duel,
    Deathmatch,
    VipTeam,
    TeamElimination,
    Unknown(u8),
}

impl TheShipMode {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => TheShipMode::Hunt,
            1 => TheShipMode::Elimination,
            2 => TheShipMode::Duel,
            3 => TheShipMode::Deathmatch,
            4 => TheShipMode::VipTeam,
            5 => TheShipMode::TeamElimination,
            other => TheShipMode::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            TheShipMode::Hunt => 0,
            TheShipMode::Elimination => 1,
            TheShipMode::Duel => 2,
            TheShipMode::Deathmatch => 3,
            TheShipMode::VipTeam => 4,
            TheShipMode::TeamElimination => 5,
            TheShipMode::Unknown(other) => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TheShipMode::Hunt => "Hunt",
            TheShipMode::Elimination => "Elimination",
            TheShipMode::Duel => "Duel",
            TheShipMode::Deathmatch => "Deathmatch",
            TheShipMode::VipTeam => "VIP Team",
            TheShipMode::TeamElimination => "Team Elimination",
            TheShipMode::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TheShipInfo {
    pub mode: TheShipMode,
    /// Witnesses needed to have a player arrested
    pub witnesses: u8,
    /// Seconds before a witnessed player is arrested
    pub duration: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceTvInfo {
    pub port: u16,
    pub name: String,
}

/// Fields announced through the Extra Data Flags byte
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedServerInfo {
    pub port: Option<u16>,
    pub steam_id: Option<u64>,
    pub keywords: Option<String>,
    pub game_id: Option<u64>,
}

impl ExtendedServerInfo {
    pub fn is_empty(&self) -> bool {
        self.port.is_none()
            && self.steam_id.is_none()
            && self.keywords.is_none()
            && self.game_id.is_none()
    }
}

/// Extra Data Flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtraDataFlags(pub u8);

impl ExtraDataFlags {
    pub const PORT: u8 = 0x80;
    pub const STEAM_ID: u8 = 0x10;
    pub const SOURCE_TV: u8 = 0x40;
    pub const KEYWORDS: u8 = 0x20;
    pub const GAME_ID: u8 = 0x01;

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Decoded A2S_INFO response
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    pub protocol: u8,
    pub name: String,
    pub map: String,
    pub folder: String,
    pub game: String,
    pub app_id: u16,
    pub players: u8,
    pub max_players: u8,
    pub bots: u8,
    pub server_type: ServerType,
    pub server_os: ServerOs,
    /// True when the server requires a password
    pub visibility: bool,
    pub vac: bool,
    pub the_ship: Option<TheShipInfo>,
    pub version: String,
    pub extended: ExtendedServerInfo,
    pub source_tv: Option<SourceTvInfo>,
}

impl ServerInfo {
    pub fn profile(&self) -> GameProfile {
        GameProfile::from_app_id(self.app_id)
    }

    /// Flags that the current optional fields will produce on the wire
    pub fn edf(&self) -> ExtraDataFlags {
        let mut edf = ExtraDataFlags::default();
        if self.extended.port.is_some() {
            edf.insert(ExtraDataFlags::PORT);
        }
        if self.extended.steam_id.is_some() {
            edf.insert(ExtraDataFlags::STEAM_ID);
        }
        if self.source_tv.is_some() {
            edf.insert(ExtraDataFlags::SOURCE_TV);
        }
        if self.extended.keywords.is_some() {
            edf.insert(ExtraDataFlags::KEYWORDS);
        }
        if self.extended.game_id.is_some() {
            edf.insert(ExtraDataFlags::GAME_ID);
        }
        edf
    }

    pub(crate) fn write_payload(&self, w: &mut PacketWriter) {
        w.write_u8(self.protocol);
        w.write_cstring(&self.name);
        w.write_cstring(&self.map);
        w.write_cstring(&self.folder);
        w.write_cstring(&self.game);
        w.write_u16(self.app_id);
        w.write_u8(self.players);
        w.write_u8(self.max_players);
        w.write_u8(self.bots);
        w.write_u8(self.server_type.to_byte());
        w.write_u8(self.server_os.to_byte());
        w.write_bool(self.visibility);
        w.write_bool(self.vac);

        if self.profile().is_the_ship() {
            let the_ship = self.the_ship.unwrap_or_default();
            w.write_u8(the_ship.mode.to_byte());
            w.write_u8(the_ship.witnesses);
            w.write_u8(the_ship.duration);
        }

        w.write_cstring(&self.version);

        let edf = self.edf();
        if edf.is_empty() {
            return;
        }
        w.write_u8(edf.0);

        // Field order is fixed by the protocol, not by flag value
        if let Some(port) = self.extended.port {
            w.write_u16(port);
        }
        if let Some(steam_id) = self.extended.steam_id {
            w.write_u64(steam_id);
        }
        if let Some(source_tv) = &self.source_tv {
            w.write_u16(source_tv.port);
            w.write_cstring(&source_tv.name);
        }
        if let Some(keywords) = &self.extended.keywords {
            w.write_cstring(keywords);
        }
        if let Some(game_id) = self.extended.game_id {
            w.write_u64(game_id);
        }
    }

    pub(crate) fn read_payload(r: &mut PacketReader<'_>) -> Result<Self> {
        let mut info = ServerInfo {
            protocol: r.read_u8("protocol")?,
            name: r.read_cstring("name")?,
            map: r.read_cstring("map")?,
            folder: r.read_cstring("folder")?,
            game: r.read_cstring("game")?,
            app_id: r.read_u16("app id")?,
            players: r.read_u8("players")?,
            max_players: r.read_u8("max players")?,
            bots: r.read_u8("bots")?,
            server_type: ServerType::from_byte(r.read_u8("server type")?),
            server_os: ServerOs::from_byte(r.read_u8("server os")?),
            visibility: r.read_bool("visibility")?,
            vac: r.read_bool("vac")?,
            ..Default::default()
        };

        if info.profile().is_the_ship() {
            info.the_ship = Some(TheShipInfo {
                mode: TheShipMode::from_byte(r.read_u8("the ship mode")?),
                witnesses: r.read_u8("the ship witnesses")?,
                duration: r.read_u8("the ship duration")?,
            });
        }

        info.version = r.read_cstring("version")?;

        if !r.has_remaining() {
            return Ok(info);
        }

        let edf = ExtraDataFlags(r.read_u8("extra data flags")?);
        if edf.contains(ExtraDataFlags::PORT) {
            info.extended.port = Some(r.read_u16("port")?);
        }
        if edf.contains(ExtraDataFlags::STEAM_ID) {
            info.extended.steam_id = Some(r.read_u64("steam id")?);
        }
        if edf.contains(ExtraDataFlags::SOURCE_TV) {
            info.source_tv = Some(SourceTvInfo {
                port: r.read_u16("source tv port")?,
                name: r.read_cstring("source tv name")?,
            });
        }
        if edf.contains(ExtraDataFlags::KEYWORDS) {
            info.extended.keywords = Some(r.read_cstring("keywords")?);
        }
        if edf.contains(ExtraDataFlags::GAME_ID) {
            info.extended.game_id = Some(r.read_u64("game id")?);
        }

        Ok(info)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TheShipPlayer {
    pub deaths: u32,
    pub money: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub index: u8,
    pub name: String,
    pub score: i32,
    /// Seconds connected to the server
    pub duration: f32,
    pub the_ship: Option<TheShipPlayer>,
}

impl Player {
    pub(crate) fn write(&self, w: &mut PacketWriter, profile: GameProfile) {
        w.write_u8(self.index);
        w.write_cstring(&self.name);
        w.write_u32(self.score as u32);
        w.write_f32(self.duration);

        if profile.is_the_ship() {
            let the_ship = self.the_ship.unwrap_or_default();
            w.write_u32(the_ship.deaths);
            w.write_u32(the_ship.money);
        }
    }

    pub(crate) fn read(r: &mut PacketReader<'_>, profile: GameProfile) -> Result<Self> {
        let mut player = Player {
            index: r.read_u8("player index")?,
            name: r.read_cstring("player name")?,
            score: r.read_u32("player score")? as i32,
            duration: r.read_f32("player duration")?,
            the_ship: None,
        };

        if profile.is_the_ship() {
            player.the_ship = Some(TheShipPlayer {
                deaths: r.read_u32("player deaths")?,
                money: r.read_u32("player money")?,
            });
        }

        Ok(player)
    }
}

/// Decoded A2S_PLAYER response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInfo {
    /// Player count as announced by the server
    pub count: u8,
    pub players: Vec<Player>,
}

/// Most player records a single response can announce
pub const MAX_PLAYERS: usize = u8::MAX as usize;

impl PlayerInfo {
    /// Builds a response from `players`, keeping at most [`MAX_PLAYERS`]
    pub fn new(mut players: Vec<Player>) -> Self {
        players.truncate(MAX_PLAYERS);
        Self {
            count: players.len() as u8,
            players,
        }
    }

    /// The count byte always matches the records that follow it, whatever
    /// `count` holds.
    pub(crate) fn write_payload(&self, w: &mut PacketWriter, profile: GameProfile) {
        let written = self.players.len().min(MAX_PLAYERS);
        w.write_u8(written as u8);
        for player in &self.players[..written] {
            player.write(w, profile);
        }
    }

    pub(crate) fn read_payload(r: &mut PacketReader<'_>, profile: GameProfile) -> Result<Self> {
        let count = r.read_u8("player count")?;
        let mut players = Vec::with_capacity(count as usize);
        for _ in 0..count {
            players.push(Player::read(r, profile)?);
        }
        Ok(Self { count, players })
    }
}
