pub mod attendance_record;
pub mod company;
pub mod day_ledger;
pub mod employee;
pub mod line_item;
pub mod product;
pub mod unloading_event;
