//! Lead scoring service.
//!
//! The scorer is injected into handlers through `AppState` so the trigger
//! logic in the lead handlers never depends on a concrete model. The default
//! implementation is a deterministic weighted heuristic; the same profile
//! always produces the same score.

/// Borrowed view of the lead fields the scorer looks at.
#[derive(Debug, Clone, Copy)]
pub struct LeadProfile<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub company: &'a str,
    pub source: Option<&'a str>,
    pub status: &'a str,
}

pub trait LeadScorer: Send + Sync {
    /// Maps a lead profile to a quality score in [0, 100].
    fn calculate_score(&self, lead: &LeadProfile<'_>) -> f64;
}

const FREE_MAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
];

#[derive(Debug, Default)]
pub struct WeightedLeadScorer;

impl LeadScorer for WeightedLeadScorer {
    fn calculate_score(&self, lead: &LeadProfile<'_>) -> f64 {
        let mut score = 10.0;

        // A full name beats a bare handle.
        if lead.name.trim().contains(char::is_whitespace) {
            score += 10.0;
        }

        score += email_weight(lead.email, lead.company);

        if !lead.company.trim().is_empty() {
            score += 15.0;
        }

        score += match lead.source.map(str::to_lowercase).as_deref() {
            Some("referral") => 20.0,
            Some("webinar") => 15.0,
            Some("website") => 10.0,
            Some("cold_call") => 5.0,
            _ => 0.0,
        };

        score += match lead.status.to_lowercase().as_str() {
            "qualified" => 15.0,
            "contacted" => 5.0,
            _ => 0.0,
        };

        score.clamp(0.0, 100.0)
    }
}

fn email_weight(email: &str, company: &str) -> f64 {
    let Some(domain) = email.rsplit('@').next().filter(|d| d.contains('.')) else {
        return 0.0;
    };
    let domain = domain.to_lowercase();

    if FREE_MAIL_DOMAINS.contains(&domain.as_str()) {
        return 5.0;
    }

    // Corporate address whose domain matches the company name is the
    // strongest signal we have.
    let company_token: String = company
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let domain_label = domain.split('.').next().unwrap_or_default();

    if !company_token.is_empty()
        && (company_token.contains(domain_label) || domain_label.contains(company_token.as_str()))
    {
        25.0
    } else {
        15.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile<'a>(
        name: &'a str,
        email: &'a str,
        company: &'a str,
        source: Option<&'a str>,
        status: &'a str,
    ) -> LeadProfile<'a> {
        LeadProfile {
            name,
            email,
            company,
            source,
            status,
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = WeightedLeadScorer;
        let lead = profile("Ada Lovelace", "ada@acme.com", "Acme", Some("referral"), "new");
        assert_eq!(
            scorer.calculate_score(&lead),
            scorer.calculate_score(&lead)
        );
    }

    #[test]
    fn corporate_domain_beats_free_mail() {
        let scorer = WeightedLeadScorer;
        let corporate = profile("Ada Lovelace", "ada@acme.com", "Acme", None, "new");
        let free_mail = profile("Ada Lovelace", "ada@gmail.com", "Acme", None, "new");
        assert!(scorer.calculate_score(&corporate) > scorer.calculate_score(&free_mail));
    }

    #[test]
    fn matching_company_domain_is_the_top_email_signal() {
        let scorer = WeightedLeadScorer;
        let matching = profile("Ada Lovelace", "ada@acme.com", "Acme Corp", None, "new");
        let unrelated = profile("Ada Lovelace", "ada@example.org", "Acme Corp", None, "new");
        assert!(scorer.calculate_score(&matching) > scorer.calculate_score(&unrelated));
    }

    #[test]
    fn referral_source_outranks_cold_call() {
        let scorer = WeightedLeadScorer;
        let referral = profile("A B", "a@x.io", "X", Some("referral"), "new");
        let cold = profile("A B", "a@x.io", "X", Some("cold_call"), "new");
        assert!(scorer.calculate_score(&referral) > scorer.calculate_score(&cold));
    }

    #[test]
    fn score_stays_in_range() {
        let scorer = WeightedLeadScorer;
        let maxed = profile(
            "Ada Lovelace",
            "ada@acme.com",
            "Acme",
            Some("referral"),
            "qualified",
        );
        let bare = profile("x", "not-an-email", "", None, "lost");
        assert!(scorer.calculate_score(&maxed) <= 100.0);
        assert!(scorer.calculate_score(&bare) >= 0.0);
    }
}
