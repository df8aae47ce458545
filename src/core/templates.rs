use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{Deposit, Snapshot};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioTemplate {
    Conservative,
    Moderate,
    Aggressive,
}

impl PortfolioTemplate {
    pub const ALL: [PortfolioTemplate; 3] = [
        PortfolioTemplate::Conservative,
        PortfolioTemplate::Moderate,
        PortfolioTemplate::Aggressive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PortfolioTemplate::Conservative => "conservative",
            PortfolioTemplate::Moderate => "moderate",
            PortfolioTemplate::Aggressive => "aggressive",
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|template| template.name().eq_ignore_ascii_case(name))
    }

    /// (label, monthly amount, expected return %, std dev %, description)
    fn rows(self) -> &'static [(&'static str, f64, f64, f64, &'static str)] {
        match self {
            PortfolioTemplate::Conservative => &[
                ("Government bonds", 600.0, 2.5, 2.0, "Low risk"),
                ("Defensive pension fund", 200.0, 3.0, 4.0, "Tax advantaged"),
                ("Term deposits", 200.0, 1.5, 1.0, "Capital guaranteed"),
            ],
            PortfolioTemplate::Moderate => &[
                ("Global equity ETF", 500.0, 7.0, 16.0, "Global diversification"),
                ("Real estate (REITs)", 300.0, 5.0, 12.0, "Passive income"),
                ("Balanced pension fund", 200.0, 5.5, 10.0, "Growth and safety"),
            ],
            PortfolioTemplate::Aggressive => &[
                ("Global equity ETF", 600.0, 8.0, 18.0, "Maximum growth"),
                ("Technology equities", 250.0, 12.0, 28.0, "High potential"),
                ("Crypto assets", 150.0, 15.0, 50.0, "High risk and return"),
            ],
        }
    }

    pub fn deposits(self) -> Vec<Deposit> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
        let end = NaiveDate::from_ymd_opt(2055, 1, 1).unwrap_or_default();
        self.rows()
            .iter()
            .zip(1..)
            .map(
                |(&(label, monthly_amount, expected, std_dev, description), id)| Deposit {
                    id,
                    label: label.to_string(),
                    monthly_amount,
                    expected_annual_return: expected,
                    annual_return_std_dev: Some(std_dev),
                    start_date: start,
                    end_date: end,
                    description: description.to_string(),
                },
            )
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListing {
    pub name: PortfolioTemplate,
    pub deposits: Vec<Deposit>,
}

pub fn template_listings() -> Vec<TemplateListing> {
    PortfolioTemplate::ALL
        .into_iter()
        .map(|template| TemplateListing {
            name: template,
            deposits: template.deposits(),
        })
        .collect()
}

/// How template deposits meet the snapshot's own.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    #[default]
    Replace,
    /// Keep existing deposits; template ids continue after the largest one.
    Append,
}

pub fn apply_template(snapshot: &mut Snapshot, template: PortfolioTemplate, mode: TemplateMode) {
    let mut deposits = template.deposits();
    match mode {
        TemplateMode::Replace => snapshot.deposits = deposits,
        TemplateMode::Append => {
            let max_id = snapshot.deposits.iter().map(|d| d.id).max().unwrap_or(0);
            for (deposit, id) in deposits.iter_mut().zip(max_id + 1..) {
                deposit.id = id;
            }
            snapshot.deposits.append(&mut deposits);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::blended_annual_return;
    use crate::core::types::BasicParams;

    #[test]
    fn names_round_trip_case_insensitively() {
        for template in PortfolioTemplate::ALL {
            assert_eq!(PortfolioTemplate::by_name(template.name()), Some(template));
        }
        assert_eq!(
            PortfolioTemplate::by_name(" Aggressive "),
            Some(PortfolioTemplate::Aggressive)
        );
        assert_eq!(PortfolioTemplate::by_name("yolo"), None);
    }

    fn empty_snapshot() -> Snapshot {
        Snapshot::new(BasicParams {
            withdrawal_rate: 4.0,
            annual_inflation: 2.0,
            current_age: 30,
            retirement_age: 50,
            annual_income: 50_000.0,
            annual_expenses: 20_000.0,
            invested_amount: 10_000.0,
        })
    }

    #[test]
    fn template_deposits_validate() {
        for template in PortfolioTemplate::ALL {
            let mut snapshot = empty_snapshot();
            apply_template(&mut snapshot, template, TemplateMode::Replace);
            assert_eq!(snapshot.deposits.len(), 3);
            assert_eq!(snapshot.validate(), Ok(()));
        }
    }

    #[test]
    fn replace_drops_existing_deposits() {
        let mut snapshot = empty_snapshot();
        apply_template(&mut snapshot, PortfolioTemplate::Aggressive, TemplateMode::Replace);
        apply_template(&mut snapshot, PortfolioTemplate::Moderate, TemplateMode::Replace);
        assert_eq!(snapshot.deposits, PortfolioTemplate::Moderate.deposits());
    }

    #[test]
    fn append_renumbers_after_largest_existing_id() {
        let mut snapshot = empty_snapshot();
        snapshot.deposits = PortfolioTemplate::Conservative.deposits();
        snapshot.deposits[1].id = 17;
        apply_template(&mut snapshot, PortfolioTemplate::Aggressive, TemplateMode::Append);

        let ids: Vec<u64> = snapshot.deposits.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 17, 3, 18, 19, 20]);
        assert_eq!(snapshot.deposits[3].label, "Global equity ETF");
        assert_eq!(snapshot.validate(), Ok(()));
    }

    #[test]
    fn append_to_empty_starts_at_one() {
        let mut snapshot = empty_snapshot();
        apply_template(&mut snapshot, PortfolioTemplate::Moderate, TemplateMode::Append);
        let ids: Vec<u64> = snapshot.deposits.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn riskier_templates_expect_more() {
        let blend = |t: PortfolioTemplate| blended_annual_return(&t.deposits(), |_| true);
        assert!(blend(PortfolioTemplate::Conservative) < blend(PortfolioTemplate::Moderate));
        assert!(blend(PortfolioTemplate::Moderate) < blend(PortfolioTemplate::Aggressive));
    }

    #[test]
    fn listings_cover_every_template() {
        let listings = template_listings();
        assert_eq!(listings.len(), 3);
        let json = serde_json::to_string(&listings).expect("serialize");
        assert!(json.contains("\"name\":\"moderate\""));
        assert!(json.contains("\"monthlyAmount\":500.0"));
    }
}
