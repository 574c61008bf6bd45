mod chart;
mod day;
mod food;
mod helpers;
mod history;
mod log;
mod weight;

pub(crate) use chart::cmd_chart;
pub(crate) use day::cmd_day_save;
pub(crate) use food::{cmd_food_list, cmd_food_show};
pub(crate) use history::{cmd_history_export, cmd_history_import, cmd_history_show};
pub(crate) use log::{cmd_log_add, cmd_log_clear, cmd_log_remove, cmd_log_show, cmd_preview};
pub(crate) use weight::cmd_weight;
