pub mod game;
pub mod html;
pub mod kst;
pub mod resolver;
pub mod rows;

pub use html::parse_schedule_html;
pub use kst::{kst_today, resolve_date_window, seconds_until_next_boundary, DateWindow};
pub use resolver::{resolve_day, resolve_month};
pub use rows::{rows_from_response, ScheduleRow};
