use crate::model::SignalLabel;
use crate::series::PreparedBar;

/// One indicator's opinion about a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalRule {
    /// Close outside the Bollinger envelope.
    Bollinger,
    /// %K against %D.
    Stochastic,
    /// Close against the Ichimoku base line.
    Ichimoku,
}

/// Evaluation order. A later rule that fires replaces the verdict of an
/// earlier one, so Ichimoku has the final word on every bar.
pub const RULE_ORDER: [SignalRule; 3] = [
    SignalRule::Bollinger,
    SignalRule::Stochastic,
    SignalRule::Ichimoku,
];

impl SignalRule {
    pub fn evaluate(self, row: &PreparedBar) -> Option<SignalLabel> {
        let close = row.bar.close;
        let ind = &row.indicators;
        match self {
            Self::Bollinger => above_below(
                close,
                ind.bb_upper,
                ind.bb_lower,
                SignalLabel::BollingerBreakout,
                SignalLabel::BollingerRebound,
            ),
            Self::Stochastic => above_below(
                ind.stoch_k,
                ind.stoch_d,
                ind.stoch_d,
                SignalLabel::StochasticBuy,
                SignalLabel::StochasticSell,
            ),
            Self::Ichimoku => above_below(
                close,
                ind.ichimoku_base,
                ind.ichimoku_base,
                SignalLabel::IchimokuBuy,
                SignalLabel::IchimokuSell,
            ),
        }
    }
}

fn above_below(
    value: f64,
    upper: f64,
    lower: f64,
    when_above: SignalLabel,
    when_below: SignalLabel,
) -> Option<SignalLabel> {
    if value > upper {
        Some(when_above)
    } else if value < lower {
        Some(when_below)
    } else {
        None
    }
}
