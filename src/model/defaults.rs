use super::question::{QuestionFields, QuestionKind};

fn choice(text: &str, options: &[&str]) -> QuestionFields {
    QuestionFields {
        text: text.to_string(),
        required: true,
        kind: QuestionKind::SingleChoice {
            options: options.iter().map(|o| o.to_string()).collect(),
        },
    }
}

fn plain(text: &str, required: bool, kind: QuestionKind) -> QuestionFields {
    QuestionFields {
        text: text.to_string(),
        required,
        kind,
    }
}

/// Seed set written the first time an admin opens an empty survey.
/// Position in the list is the seeded `order` (1-based).
pub fn default_questions() -> Vec<QuestionFields> {
    vec![
        plain("Name", true, QuestionKind::ShortText),
        plain("Institution Name", true, QuestionKind::ShortText),
        plain(
            "Year of Study",
            true,
            QuestionKind::Dropdown {
                options: ["1st year", "2nd year", "3rd year", "4th year", "Graduate", "Other"]
                    .iter()
                    .map(|o| o.to_string())
                    .collect(),
            },
        ),
        choice(
            "Primary Field of Interest",
            &[
                "AI/ML",
                "Web Development",
                "Mobile Development",
                "Cybersecurity",
                "Data Science",
                "Cloud/DevOps",
                "IoT/Hardware",
                "Game Development",
                "Other",
            ],
        ),
        plain("Have you attended any Hackathons?", true, QuestionKind::YesNo),
        plain(
            "Problems faced related to hackathon selection",
            false,
            QuestionKind::ShortText,
        ),
        choice(
            "Biggest challenge when showcasing projects",
            &[
                "Visibility",
                "Feedback quality",
                "Judging criteria",
                "Time to present",
                "Team coordination",
                "Other",
            ],
        ),
        choice(
            "Where do you usually search for opportunities?",
            &[
                "University notices",
                "Online communities",
                "Social media",
                "Event platforms",
                "Friends/peers",
                "Other",
            ],
        ),
        choice(
            "Where do you show your projects now?",
            &[
                "GitHub",
                "Personal website",
                "Devpost",
                "LinkedIn",
                "Not currently showcasing",
                "Other",
            ],
        ),
        choice(
            "Interest in project-based evaluation platform",
            &[
                "Very interested",
                "Interested",
                "Neutral",
                "Not interested",
                "Not sure",
            ],
        ),
        plain(
            "Expected useful features",
            true,
            QuestionKind::MultiChoice {
                options: [
                    "One-link profile",
                    "Project analytics",
                    "Peer feedback",
                    "Mentor reviews",
                    "Hiring visibility",
                    "Team matching",
                    "Event recommendations",
                    "Portfolio templates",
                    "Other",
                ]
                .iter()
                .map(|o| o.to_string())
                .collect(),
            },
        ),
        plain(
            "Usefulness of one-link project profile",
            true,
            QuestionKind::Scale,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::default_questions;
    use std::collections::BTreeSet;

    #[test]
    fn defaults_cover_every_type() {
        let defaults = default_questions();
        assert_eq!(defaults.len(), 12);
        let tags = defaults
            .iter()
            .map(|q| q.kind.type_tag())
            .collect::<BTreeSet<&str>>();
        assert_eq!(tags.len(), 6);
    }
}
