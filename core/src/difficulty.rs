use serde::{Deserialize, Serialize};

/// Difficulty constants the host applies to customer flow and shop stock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultySettings {
    /// Percentage removed from the customer rate per exponent point.
    pub customer_change_per_point: f32,
    /// Blueprint slots offered on day one.
    pub base_shop_count: u32,
    /// Days after which one more blueprint slot is offered; zero disables growth.
    pub shop_count_growth_interval: u32,
    /// Blueprint slots reserved for staples.
    pub staple_count: u32,
    /// Days between decoration shops; zero disables them.
    pub decoration_day_interval: u32,
}

impl DifficultySettings {
    /// Total number of blueprint slots offered at the end of `day`.
    #[must_use]
    pub fn total_shop_count(&self, day: i32) -> u32 {
        let elapsed = u32::try_from(day).unwrap_or(0);
        let growth = if self.shop_count_growth_interval == 0 {
            0
        } else {
            elapsed / self.shop_count_growth_interval
        };
        self.base_shop_count.saturating_add(growth)
    }

    /// Number of staple slots offered at the end of `day`.
    #[must_use]
    pub fn staple_count(&self, _day: i32) -> u32 {
        self.staple_count
    }

    /// Reports whether `day` replaces the regular shop with a decoration shop.
    #[must_use]
    pub fn is_decoration_day(&self, day: i32) -> bool {
        let interval = i32::try_from(self.decoration_day_interval).unwrap_or(i32::MAX);
        interval > 0 && day > 0 && day % interval == 0
    }
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            customer_change_per_point: 10.0,
            base_shop_count: 4,
            shop_count_growth_interval: 3,
            staple_count: 1,
            decoration_day_interval: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DifficultySettings;

    #[test]
    fn shop_count_grows_with_days() {
        let settings = DifficultySettings::default();
        assert_eq!(settings.total_shop_count(0), 4);
        assert_eq!(settings.total_shop_count(7), 6);
        assert_eq!(settings.total_shop_count(-1), 4);
    }

    #[test]
    fn decoration_days_follow_interval() {
        let settings = DifficultySettings::default();
        assert!(settings.is_decoration_day(5));
        assert!(settings.is_decoration_day(10));
        assert!(!settings.is_decoration_day(0));
        assert!(!settings.is_decoration_day(6));
    }
}
