//! The site owner's professional profile.
//!
//! The profile is static by design: this service presents one person. It is
//! constructed once in `main` and injected through `AppState`, so tests can
//! swap in a fixture without touching globals.

use serde::Serialize;

pub mod prompts;

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub location: String,
    pub email: String,
    pub website: String,
    pub summary: String,
    pub years_of_experience: u32,
    pub roles: Vec<Role>,
    pub skills: Vec<SkillGroup>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Role {
    pub company: String,
    pub title: String,
    pub period: String,
    pub achievements: Vec<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillGroup {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub year: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

impl Profile {
    /// Every skill item across all groups, for keyword matching.
    pub fn all_skills(&self) -> Vec<&str> {
        self.skills
            .iter()
            .flat_map(|group| group.items.iter().map(String::as_str))
            .collect()
    }

    /// The owner's résumé data. Edit here to re-skin the site for someone
    /// else.
    pub fn owner() -> Self {
        Self {
            name: "Jordan Hale".to_string(),
            title: "CTO & Engineering Leader".to_string(),
            location: "Austin, TX".to_string(),
            email: "jordan@jordanhale.dev".to_string(),
            website: "https://jordanhale.dev".to_string(),
            summary: "Engineering leader with 15+ years building and scaling product \
                      teams, from seed-stage startups to a 120-person org. Hands-on \
                      with distributed systems and cloud infrastructure; led two \
                      zero-to-one platform builds and one acquisition integration."
                .to_string(),
            years_of_experience: 16,
            roles: vec![
                Role {
                    company: "Driftline".to_string(),
                    title: "Chief Technology Officer".to_string(),
                    period: "2020 - present".to_string(),
                    achievements: vec![
                        "Grew engineering from 12 to 65 across 8 teams while holding \
                         regretted attrition under 5%"
                            .to_string(),
                        "Led re-platform from a monolith to event-driven services, \
                         cutting p99 checkout latency from 2.1s to 380ms"
                            .to_string(),
                        "Took SOC 2 Type II from zero to certified in 9 months"
                            .to_string(),
                        "Owned a $14M cloud budget and reduced unit infrastructure \
                         cost 31% year over year"
                            .to_string(),
                    ],
                    technologies: vec![
                        "AWS".to_string(),
                        "Kubernetes".to_string(),
                        "Go".to_string(),
                        "PostgreSQL".to_string(),
                        "Kafka".to_string(),
                        "Terraform".to_string(),
                    ],
                },
                Role {
                    company: "Parcelflow".to_string(),
                    title: "VP of Engineering".to_string(),
                    period: "2016 - 2020".to_string(),
                    achievements: vec![
                        "Built the logistics-routing platform handling 2M shipments \
                         per day"
                            .to_string(),
                        "Introduced trunk-based delivery, taking release cadence from \
                         monthly to daily"
                            .to_string(),
                        "Hired and ran a 30-person org across product, platform, and \
                         data engineering"
                            .to_string(),
                    ],
                    technologies: vec![
                        "Python".to_string(),
                        "TypeScript".to_string(),
                        "GCP".to_string(),
                        "Redis".to_string(),
                        "BigQuery".to_string(),
                    ],
                },
                Role {
                    company: "Nimbus Labs".to_string(),
                    title: "Senior Software Engineer, then Engineering Manager"
                        .to_string(),
                    period: "2009 - 2016".to_string(),
                    achievements: vec![
                        "Early engineer on a B2B analytics product acquired in 2015"
                            .to_string(),
                        "Designed the multi-tenant ingestion pipeline sustaining 50k \
                         events per second"
                            .to_string(),
                        "Moved into management, running two product teams through the \
                         acquisition"
                            .to_string(),
                    ],
                    technologies: vec![
                        "Java".to_string(),
                        "Scala".to_string(),
                        "Cassandra".to_string(),
                        "RabbitMQ".to_string(),
                    ],
                },
            ],
            skills: vec![
                SkillGroup {
                    category: "Leadership".to_string(),
                    items: vec![
                        "Org design".to_string(),
                        "Hiring".to_string(),
                        "Technical strategy".to_string(),
                        "Executive communication".to_string(),
                        "Budget ownership".to_string(),
                    ],
                },
                SkillGroup {
                    category: "Architecture".to_string(),
                    items: vec![
                        "Distributed systems".to_string(),
                        "Event-driven design".to_string(),
                        "API design".to_string(),
                        "Cloud infrastructure".to_string(),
                        "Observability".to_string(),
                    ],
                },
                SkillGroup {
                    category: "Languages".to_string(),
                    items: vec![
                        "Go".to_string(),
                        "Python".to_string(),
                        "TypeScript".to_string(),
                        "Rust".to_string(),
                        "Java".to_string(),
                        "SQL".to_string(),
                    ],
                },
                SkillGroup {
                    category: "Platforms".to_string(),
                    items: vec![
                        "AWS".to_string(),
                        "GCP".to_string(),
                        "Kubernetes".to_string(),
                        "PostgreSQL".to_string(),
                        "Kafka".to_string(),
                        "Redis".to_string(),
                        "Terraform".to_string(),
                    ],
                },
            ],
            education: vec![Education {
                institution: "University of Texas at Austin".to_string(),
                degree: "B.S.".to_string(),
                field: "Computer Science".to_string(),
                year: "2009".to_string(),
            }],
            projects: vec![
                Project {
                    name: "opensilo".to_string(),
                    description: "Open-source schema registry for event streams; 3.1k \
                                  GitHub stars, used in production by a dozen companies"
                        .to_string(),
                    technologies: vec!["Go".to_string(), "Kafka".to_string()],
                    url: Some("https://github.com/jhale/opensilo".to_string()),
                },
                Project {
                    name: "Scaling After the Seed (talk series)".to_string(),
                    description: "Conference talks on growing engineering orgs past 20 \
                                  people without losing delivery speed"
                        .to_string(),
                    technologies: vec![],
                    url: None,
                },
            ],
        }
    }
}
