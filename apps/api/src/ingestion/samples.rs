//! Illustrative postings seeded when every feed is unreachable and storage is
//! empty. Only used when `SEED_SAMPLE_POSTINGS` is enabled.

use chrono::Utc;

use crate::ingestion::scoring::score;
use crate::models::posting::NewPosting;

pub const SAMPLE_SOURCE_NAME: &str = "Sample Feed";

struct Sample {
    title: &'static str,
    company: &'static str,
    description: &'static str,
    location: &'static str,
    url: &'static str,
    /// Short keyword text scored against the user's skill.
    keywords: &'static str,
    default_score: f64,
}

const SAMPLES: &[Sample] = &[
    Sample {
        title: "Senior Software Developer",
        company: "Tech Corp",
        description: "We are looking for an experienced software developer with strong JavaScript and React skills. Remote position available.",
        location: "Remote",
        url: "https://example.com/job1",
        keywords: "JavaScript React Developer",
        default_score: 50.0,
    },
    Sample {
        title: "Full Stack Developer",
        company: "StartupXYZ",
        description: "Join our team as a full stack developer. Experience with Node.js, Python, and modern web technologies required.",
        location: "Hybrid",
        url: "https://example.com/job2",
        keywords: "Node.js Python Full Stack",
        default_score: 40.0,
    },
    Sample {
        title: "Frontend Developer",
        company: "Design Studio",
        description: "Looking for a creative frontend developer with expertise in HTML, CSS, and JavaScript frameworks.",
        location: "Remote",
        url: "https://example.com/job3",
        keywords: "HTML CSS JavaScript Frontend",
        default_score: 45.0,
    },
];

/// Builds the sample set, scored against `skill` when one is known.
pub fn sample_postings(skill: Option<&str>) -> Vec<NewPosting> {
    let now = Utc::now();
    SAMPLES
        .iter()
        .map(|s| NewPosting {
            title: s.title.to_string(),
            company: s.company.to_string(),
            description: s.description.to_string(),
            location: Some(s.location.to_string()),
            source_url: s.url.to_string(),
            source_name: SAMPLE_SOURCE_NAME.to_string(),
            published_at: now,
            relevance_score: skill.map_or(s.default_score, |skill| score(s.keywords, skill)),
        })
        .collect()
}
