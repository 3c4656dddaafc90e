//! Packed date and time fields of a directory entry.
//!
//! date: bits 0..5 day, bits 5..9 month, bits 9..16 years since 1980
//! time: bits 5..11 minutes, bits 11..16 hours (the two-second field in bits 0..5 is not decoded)

use core::fmt::{Display, Formatter};

pub const FAT_EPOCH_YEAR: u16 = 1980;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FatDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FatTime {
    pub hours: u8,
    pub minutes: u8,
}

impl FatDate {
    pub fn decode(raw: u16) -> Self {
        Self {
            day: (raw & 0x1F) as u8,
            month: ((raw >> 5) & 0x0F) as u8,
            year: ((raw >> 9) & 0x7F) + FAT_EPOCH_YEAR,
        }
    }

    /// Fields out of range are truncated to their bit width.
    pub fn encode(&self) -> u16 {
        let years = self.year.saturating_sub(FAT_EPOCH_YEAR) & 0x7F;
        (years << 9) | ((self.month as u16 & 0x0F) << 5) | (self.day as u16 & 0x1F)
    }
}

impl FatTime {
    pub fn decode(raw: u16) -> Self {
        Self {
            minutes: ((raw >> 5) & 0x3F) as u8,
            hours: ((raw >> 11) & 0x1F) as u8,
        }
    }

    pub fn encode(&self) -> u16 {
        ((self.hours as u16 & 0x1F) << 11) | ((self.minutes as u16 & 0x3F) << 5)
    }
}

impl Display for FatDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl Display for FatTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn decode_date() {
        // 2023-07-14: (43 << 9) | (7 << 5) | 14
        let date = FatDate::decode((43 << 9) | (7 << 5) | 14);
        assert_eq!(
            date,
            FatDate {
                year: 2023,
                month: 7,
                day: 14
            }
        );
        assert_eq!(date.to_string(), "2023-07-14");
    }

    #[test]
    fn decode_time_ignores_seconds() {
        // 13:45:58 -> seconds field 29
        let time = FatTime::decode((13 << 11) | (45 << 5) | 29);
        assert_eq!(
            time,
            FatTime {
                hours: 13,
                minutes: 45
            }
        );
        assert_eq!(time.to_string(), "13:45");
    }

    #[test]
    fn decode_is_total() {
        let date = FatDate::decode(0xFFFF);
        assert_eq!((date.year, date.month, date.day), (2107, 15, 31));
        let date = FatDate::decode(0);
        assert_eq!((date.year, date.month, date.day), (1980, 0, 0));
        let time = FatTime::decode(0xFFFF);
        assert_eq!((time.hours, time.minutes), (31, 63));
    }

    #[test]
    fn encode_matches_decode() {
        let date = FatDate {
            year: 1999,
            month: 12,
            day: 31,
        };
        assert_eq!(FatDate::decode(date.encode()), date);
        let time = FatTime {
            hours: 23,
            minutes: 59,
        };
        assert_eq!(FatTime::decode(time.encode()), time);
    }
}
