//! Schedule page HTML → games, used when the list feed has nothing.
//!
//! The page's table usually arrives empty (rows are injected client side), so
//! this is a last resort. Column layout when present:
//! `시간 | 경기 | 중계 | 구장 | 비고`.

use crate::extract::extract_table;
use crate::schedule::game::{
    broadcast_tokens, find_score, find_time, is_broadcast_list, is_stadium, matchup_tokens, matchup_vs,
    pick_details,
};
use crate::types::{ScheduleGame, TableKind};

pub fn parse_schedule_html(html: &str) -> Vec<ScheduleGame> {
    extract_table(html, TableKind::Schedule)
        .iter()
        .filter_map(|cells| game_from_cells(cells))
        .collect()
}

fn game_from_cells(cells: &[String]) -> Option<ScheduleGame> {
    let text = cells.join(" ");
    let mut game = ScheduleGame::default();

    if cells.len() >= 3 {
        game.time = find_time(&cells[0]);
        if is_broadcast_list(&cells[2]) {
            game.broadcasts = Some(broadcast_tokens(&cells[2]));
        }
        game.stadium = cells.get(3).filter(|c| is_stadium(c)).cloned();
    }

    let matchup = cells
        .get(1)
        .and_then(|c| matchup_vs(c))
        .or_else(|| matchup_vs(&text))
        .or_else(|| matchup_tokens(&text))?;
    matchup.apply(&mut game);

    if game.away_score.is_none() && game.home_score.is_none() {
        if let Some((away, home)) = find_score(&text) {
            game.away_score = Some(away);
            game.home_score = Some(home);
        }
    }

    pick_details(cells, &mut game);
    Some(game)
}
