//! Read model over the timeframe stores
//!
//! Rows are exposed as camelCase JSON views: `serverId`, `steamId`, `name`,
//! `clan`, one key per registry column, a `<column>Formatted` companion for
//! duration columns, and `updatedAt`.

pub mod clans;
pub mod leaderboard;
pub mod player;
pub mod view;

pub use clans::{clan_view, roll_up_clans, ClanRollup};
pub use leaderboard::{
    clamp_limit, leaderboard, parse_server_filter, parse_timeframe, Leaderboard, LeaderboardParams,
    LeaderboardQuery, DEFAULT_LIMIT, DEFAULT_SORT, MAX_LIMIT,
};
pub use player::{player_everywhere, player_on_server};
pub use view::{camel_case, player_view};
