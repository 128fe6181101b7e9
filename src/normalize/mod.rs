pub mod fields;
pub mod html_tables;
pub mod loose;
pub mod season_json;
pub mod top_players;

pub use html_tables::{normalize_defense, normalize_offense, normalize_rankings};
pub use season_json::{adapt_defense, adapt_offense, adapt_rankings, SeasonResponse};
pub use top_players::{adapt_top_players, TopCategories, TopPlayersPayload};
