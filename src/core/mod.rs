pub mod clock;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, TrackerError};
pub use types::{
    DATE_KEY_FORMAT, MONTH_KEY_FORMAT, MONTH_KEY_LEN, UserRecord, date_key, month_key, month_of,
    parse_date_key, record_key,
};
