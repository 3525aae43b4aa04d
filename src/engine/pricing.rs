// ==========================================
// 花卉供货导入 - 定价与库存规则
// ==========================================
// 职责: 新规格零售价、库存合并模式、金额舍入
// 红线: 纯函数，不访问数据库；金额一律 Decimal
// ==========================================

use crate::domain::types::StockMode;
use rust_decimal::{Decimal, RoundingStrategy};

/// 默认加价系数（成本 × 1.10）
pub const DEFAULT_MARKUP_FACTOR: Decimal = Decimal::from_parts(110, 0, 0, false, 2);

/// 金额保留 2 位小数（半分进位，远离零）
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// 新规格零售价 = round2(成本 × 加价系数 × 汇率)
///
/// 仅在创建规格时使用；已有规格的零售价不随导入变化
pub fn new_variant_price(cost_price: Decimal, markup_factor: Decimal, rate: Decimal) -> Decimal {
    round2(cost_price * markup_factor * rate)
}

/// 库存合并
///
/// - Replace: 使用导入值
/// - Add: 累加
/// - Skip: 保留现有值
pub fn apply_stock_mode(existing: i64, incoming: i64, mode: StockMode) -> i64 {
    match mode {
        StockMode::Replace => incoming,
        StockMode::Add => existing.saturating_add(incoming),
        StockMode::Skip => existing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_stock_modes() {
        assert_eq!(apply_stock_mode(200, 50, StockMode::Replace), 50);
        assert_eq!(apply_stock_mode(200, 50, StockMode::Add), 250);
        assert_eq!(apply_stock_mode(200, 50, StockMode::Skip), 200);
    }

    #[test]
    fn test_new_variant_price() {
        assert_eq!(new_variant_price(dec("2.0"), DEFAULT_MARKUP_FACTOR, dec("45.0")), dec("99.00"));
        assert_eq!(new_variant_price(Decimal::ONE, DEFAULT_MARKUP_FACTOR, Decimal::ONE), dec("1.1"));
        // 0.45 × 1.10 × 45 = 22.275
        assert_eq!(new_variant_price(dec("0.45"), DEFAULT_MARKUP_FACTOR, dec("45")), dec("22.28"));
    }

    #[test]
    fn test_round2_half_cent_goes_up() {
        assert_eq!(round2(dec("1.005")), dec("1.01"));
        assert_eq!(round2(dec("2.675")), dec("2.68"));
        assert_eq!(round2(dec("-0.125")), dec("-0.13"));
        assert_eq!(round2(dec("6.333333")), dec("6.33"));
        assert_eq!(round2(dec("0.456")), dec("0.46"));
    }
}
