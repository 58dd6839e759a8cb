//! Salary parsing.
//!
//! Amount extraction is a fixed chain of strategies (`range`, then
//! `single`); currency and period are read from the same text and the
//! result is annualized.

use regex::Regex;

use crate::error::Result;
use crate::models::{SalaryPeriod, SalaryRange};

const AMOUNT: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?";

/// Extracts raw amounts from salary text, before any scaling.
pub trait SalaryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Low and high amounts, with `k` suffixes applied.
    fn amounts(&self, text: &str) -> Option<(f64, f64)>;
}

/// Two amounts joined by `-`, `–`, `—` or `to`.
pub struct RangeStrategy {
    re: Regex,
}

impl RangeStrategy {
    pub fn new() -> Result<Self> {
        let pattern = format!(
            r"(?i)(?P<lo>{AMOUNT})\s*(?P<lok>k\b)?[^\d\-–—]{{0,6}}?\s*(?:-|–|—|\bto\b)\s*[^\d\s]{{0,4}}\s*(?P<hi>{AMOUNT})\s*(?P<hik>k\b)?"
        );
        Ok(Self {
            re: Regex::new(&pattern)?,
        })
    }
}

impl SalaryStrategy for RangeStrategy {
    fn name(&self) -> &'static str {
        "range"
    }

    fn amounts(&self, text: &str) -> Option<(f64, f64)> {
        let caps = self.re.captures(text)?;
        let mut lo = parse_amount(caps.name("lo")?.as_str())?;
        let mut hi = parse_amount(caps.name("hi")?.as_str())?;
        let lok = caps.name("lok").is_some();
        let hik = caps.name("hik").is_some();

        // "100-120k" shares the suffix
        if lok || (hik && lo < 1000.0) {
            lo *= 1000.0;
        }
        if hik || (lok && hi < 1000.0) {
            hi *= 1000.0;
        }
        Some((lo, hi))
    }
}

/// One amount, optionally after `up to` or `from`.
pub struct SingleStrategy {
    re: Regex,
}

impl SingleStrategy {
    pub fn new() -> Result<Self> {
        let pattern = format!(r"(?i)(?P<amt>{AMOUNT})\s*(?P<k>k\b)?");
        Ok(Self {
            re: Regex::new(&pattern)?,
        })
    }
}

impl SalaryStrategy for SingleStrategy {
    fn name(&self) -> &'static str {
        "single"
    }

    fn amounts(&self, text: &str) -> Option<(f64, f64)> {
        let caps = self.re.captures(text)?;
        let mut amount = parse_amount(caps.name("amt")?.as_str())?;
        if caps.name("k").is_some() {
            amount *= 1000.0;
        }
        Some((amount, amount))
    }
}

fn parse_amount(s: &str) -> Option<f64> {
    s.replace(',', "").parse::<f64>().ok()
}

/// Salary parser: strategy chain plus currency and period detection.
pub struct SalaryParser {
    strategies: Vec<Box<dyn SalaryStrategy>>,
    default_currency: String,
    code_re: Regex,
    period_re: Regex,
    benefit_re: Regex,
    signal_re: Regex,
    fragment_re: Regex,
}

impl SalaryParser {
    pub fn new(default_currency: &str) -> Result<Self> {
        Ok(Self {
            strategies: vec![
                Box::new(RangeStrategy::new()?),
                Box::new(SingleStrategy::new()?),
            ],
            default_currency: default_currency.trim().to_uppercase(),
            code_re: Regex::new(
                r"(?i)\b(USD|EUR|GBP|CAD|AUD|NZD|INR|JPY|CHF|SEK|NOK|DKK|PLN|SGD|BRL|MXN)\b",
            )?,
            // Period words count only right after an amount
            period_re: Regex::new(
                r"(?i)\d\s*k?\s*(?:(?:USD|EUR|GBP|CAD|AUD|NZD|INR|JPY|CHF)\s*)?(?:(?:/\s*|\bper\s+|\ban?\s+)(?P<unit>hours?|hrs?|days?|weeks?|wks?|months?|mos?|years?|yrs?|annum)\b|,?\s*(?P<adv>hourly|daily|weekly|monthly|yearly|annually|annual|p\.a\.?))",
            )?,
            // Retirement plans and percentages are not pay
            benefit_re: Regex::new(
                r"(?i)\b\d+\s*\(\s*[kb]\s*\)|\b40[13]\s*[kb]\b|\b457\s*b\b|\b\d+\s*k\s+match\w*|\d+(?:\.\d+)?\s*%",
            )?,
            signal_re: Regex::new(
                r"(?i)[$€£₹¥]|\b(?:USD|EUR|GBP|CAD|AUD|NZD|INR|JPY|CHF|SEK|NOK|DKK|PLN|SGD|BRL|MXN)\b|\d\s*k\b|\b(?:salary|pay|wages?|compensation)\b|\b(?:up\s+to|from|starting\s+at)\s*\d",
            )?,
            fragment_re: Regex::new(&format!(
                r"(?i)(?:[$€£₹¥]\s?(?:{AMOUNT})\s*k?(?:\s*(?:-|–|—|to)\s*[$€£₹¥]?\s?(?:{AMOUNT})\s*k?)?(?:\s*(?:per|/|an?)\s*(?:hour|hr|year|yr|annum|month|mo|week|day))?|(?:{AMOUNT})\s*k?(?:\s*(?:-|–|—|to)\s*(?:{AMOUNT})\s*k?)?\s*(?:USD|EUR|GBP|CAD|AUD)?\s*(?:per\s*|/\s*|an?\s+)(?:hour|hr|year|yr|annum|month|mo)\b|salary:?\s*[$€£]?\s?(?:{AMOUNT})\s*k?)"
            ))?,
        })
    }

    /// Parse a salary field. `None` when nothing usable is found.
    ///
    /// Amounts need a salary signal: a currency, a `k` suffix, a period
    /// attached to the amount or a pay keyword. Bare numbers are ignored.
    pub fn parse(&self, text: &str) -> Option<SalaryRange> {
        let cleaned = self.benefit_re.replace_all(text, " ");
        let text = cleaned.trim();
        if text.is_empty() {
            return None;
        }

        let period = self.period(text);
        if period.is_none() && !self.signal_re.is_match(text) {
            return None;
        }

        let (strategy, (lo, hi)) = self
            .strategies
            .iter()
            .find_map(|s| s.amounts(text).map(|a| (s.name(), a)))?;

        if !(lo.is_finite() && hi.is_finite()) || lo <= 0.0 || hi <= 0.0 {
            return None;
        }

        let currency = self.currency(text);
        let range = match period {
            Some(period) => SalaryRange::annualized(lo, hi, currency, period),
            None => SalaryRange::annualized(
                scale_unlabeled(lo),
                scale_unlabeled(hi),
                currency,
                SalaryPeriod::Year,
            ),
        };
        log::trace!("salary '{text}' parsed by {strategy}: {range}");
        Some(range)
    }

    /// Look for a salary-looking fragment in free text and parse it.
    pub fn parse_description(&self, text: &str) -> Option<SalaryRange> {
        self.fragment_re
            .find_iter(text)
            .find_map(|m| self.parse(m.as_str()))
    }

    fn currency(&self, text: &str) -> String {
        if let Some(m) = self.code_re.find(text) {
            return m.as_str().to_uppercase();
        }

        let symbols: [(&str, &str); 10] = [
            ("CA$", "CAD"),
            ("C$", "CAD"),
            ("AU$", "AUD"),
            ("A$", "AUD"),
            ("US$", "USD"),
            ("$", "USD"),
            ("€", "EUR"),
            ("£", "GBP"),
            ("₹", "INR"),
            ("¥", "JPY"),
        ];
        symbols
            .iter()
            .find(|(sym, _)| text.contains(sym))
            .map(|(_, code)| code.to_string())
            .unwrap_or_else(|| self.default_currency.clone())
    }

    fn period(&self, text: &str) -> Option<SalaryPeriod> {
        let caps = self.period_re.captures(text)?;
        let word = caps
            .name("unit")
            .or_else(|| caps.name("adv"))?
            .as_str()
            .to_lowercase();
        let period = match word.trim_end_matches('s') {
            "hourly" | "hour" | "hr" => SalaryPeriod::Hour,
            "daily" | "day" => SalaryPeriod::Day,
            "weekly" | "week" | "wk" => SalaryPeriod::Week,
            "monthly" | "month" | "mo" => SalaryPeriod::Month,
            _ => SalaryPeriod::Year,
        };
        Some(period)
    }
}

/// Without a period, small amounts are thousands.
fn scale_unlabeled(amount: f64) -> f64 {
    if amount >= 1000.0 {
        amount
    } else {
        amount * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SalaryParser {
        SalaryParser::new("USD").unwrap()
    }

    fn bounds(text: &str) -> Option<(f64, f64, String, SalaryPeriod)> {
        parser()
            .parse(text)
            .map(|r| (r.min, r.max, r.currency, r.period))
    }

    #[test]
    fn test_k_ranges() {
        assert_eq!(
            bounds("$100k-$120k"),
            Some((100_000.0, 120_000.0, "USD".into(), SalaryPeriod::Year))
        );
        assert_eq!(
            bounds("100-120k"),
            Some((100_000.0, 120_000.0, "USD".into(), SalaryPeriod::Year))
        );
        assert_eq!(
            bounds("€40K – €55K"),
            Some((40_000.0, 55_000.0, "EUR".into(), SalaryPeriod::Year))
        );
    }

    #[test]
    fn test_separated_amounts_with_code_and_period() {
        assert_eq!(
            bounds("100,000-120,000 USD/yr"),
            Some((100_000.0, 120_000.0, "USD".into(), SalaryPeriod::Year))
        );
        assert_eq!(
            bounds("£50,000 to £60,000 per annum"),
            Some((50_000.0, 60_000.0, "GBP".into(), SalaryPeriod::Year))
        );
        assert_eq!(
            bounds("C$90,000 — C$110,000"),
            Some((90_000.0, 110_000.0, "CAD".into(), SalaryPeriod::Year))
        );
    }

    #[test]
    fn test_periods_are_annualized() {
        assert_eq!(
            bounds("$50 - $60 an hour"),
            Some((104_000.0, 124_800.0, "USD".into(), SalaryPeriod::Hour))
        );
        assert_eq!(
            bounds("$8,000 a month"),
            Some((96_000.0, 96_000.0, "USD".into(), SalaryPeriod::Month))
        );
        assert_eq!(
            bounds("₹2,000 per day"),
            Some((520_000.0, 520_000.0, "INR".into(), SalaryPeriod::Day))
        );
    }

    #[test]
    fn test_single_amounts_and_defaults() {
        assert_eq!(
            bounds("Up to $150,000"),
            Some((150_000.0, 150_000.0, "USD".into(), SalaryPeriod::Year))
        );
        assert_eq!(
            bounds("From 85"),
            Some((85_000.0, 85_000.0, "USD".into(), SalaryPeriod::Year))
        );
        let eur = SalaryParser::new("eur").unwrap();
        assert_eq!(
            eur.parse("70,000 per year").map(|r| r.currency),
            Some("EUR".into())
        );
        assert_eq!(
            bounds("Pay: 25 hourly"),
            Some((52_000.0, 52_000.0, "USD".into(), SalaryPeriod::Hour))
        );
    }

    #[test]
    fn test_reversed_bounds_are_swapped() {
        let range = parser().parse("$120k - $100k").unwrap();
        assert_eq!((range.min, range.max), (100_000.0, 120_000.0));
    }

    #[test]
    fn test_unparsable_is_absent() {
        assert_eq!(bounds(""), None);
        assert_eq!(bounds("Competitive"), None);
        assert_eq!(bounds("DOE"), None);
        assert_eq!(bounds("$0"), None);
    }

    #[test]
    fn test_benefits_and_shifts_are_not_salary() {
        assert_eq!(bounds("401(k) matching"), None);
        assert_eq!(bounds("Competitive, 401k"), None);
        assert_eq!(bounds("401k match up to 6%"), None);
        assert_eq!(bounds("8 hour shift"), None);
        assert_eq!(bounds("10 hour shift, Monday to Friday"), None);
        assert_eq!(bounds("2 years experience"), None);
        assert_eq!(bounds("5-10 person team"), None);
    }

    #[test]
    fn test_period_must_follow_the_amount() {
        assert_eq!(
            bounds("$120k, 8 hour shift"),
            Some((120_000.0, 120_000.0, "USD".into(), SalaryPeriod::Year))
        );
        assert_eq!(
            bounds("$30 /hr, 401(k) matching"),
            Some((62_400.0, 62_400.0, "USD".into(), SalaryPeriod::Hour))
        );
    }

    #[test]
    fn test_bounds_ordered_for_many_inputs() {
        let p = parser();
        let inputs = [
            "$100k-$120k",
            "90 - 70k",
            "$45.50 - $38 per hour",
            "120,000 to 95,000 EUR",
            "£700 - £500 a week",
            "3000-2500/mo",
            "¥6,000,000 - ¥5,000,000",
        ];
        for input in inputs {
            let range = p.parse(input).unwrap();
            assert!(range.min <= range.max, "{input}: {range:?}");
        }
    }

    #[test]
    fn test_salary_from_description() {
        let p = parser();
        let desc = "We offer 401k matching. Compensation: $130,000 - $160,000 per year plus equity.";
        let range = p.parse_description(desc).unwrap();
        assert_eq!((range.min, range.max), (130_000.0, 160_000.0));

        assert!(p.parse_description("Join our 5-10 person team").is_none());
    }
}
