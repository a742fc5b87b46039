//! Built-in skill taxonomy
//!
//! Used when the configuration declares no `[[taxonomy]]` entries. Order
//! matters: a skill listed under two categories resolves to the first one.

use crate::config::TaxonomyEntry;

pub const DEFAULT_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "Programming Languages",
        &[
            "python", "r", "sql", "scala", "java", "c#", "julia", "sas", "vba", "dax", "m",
            "bash", "javascript", "typescript", "go",
        ],
    ),
    (
        "BI & Visualization",
        &[
            "power bi", "tableau", "looker", "looker studio", "qlik", "qlik sense", "qlikview",
            "superset", "metabase", "microstrategy", "cognos", "ssrs", "grafana", "excel",
        ],
    ),
    (
        "Databases",
        &[
            "postgresql", "mysql", "sql server", "ms sql", "oracle", "mongodb", "redis",
            "snowflake", "bigquery", "redshift", "teradata", "clickhouse", "elasticsearch",
            "cassandra", "sqlite",
        ],
    ),
    (
        "Big Data & Data Engineering",
        &[
            "spark", "pyspark", "hadoop", "hive", "kafka", "airflow", "dbt", "databricks",
            "flink", "etl", "elt", "ssis", "informatica", "talend", "nifi", "data factory",
        ],
    ),
    (
        "Cloud",
        &[
            "aws", "azure", "gcp", "google cloud", "google cloud platform", "amazon web services",
            "s3", "lambda", "glue", "athena",
        ],
    ),
    (
        "Machine Learning & AI",
        &[
            "machine learning", "deep learning", "pandas", "numpy", "scikit-learn", "sklearn",
            "tensorflow", "pytorch", "keras", "nlp", "llm", "mlflow", "xgboost", "statistics",
        ],
    ),
    (
        "Microsoft Ecosystem",
        &[
            "power bi", "power query", "power apps", "power automate", "microsoft fabric",
            "fabric", "sharepoint", "azure synapse", "synapse", "ssas",
        ],
    ),
    (
        "Tools & Practices",
        &[
            "git", "github", "gitlab", "docker", "kubernetes", "jira", "confluence", "linux",
            "ci/cd", "agile", "scrum", "terraform", "jenkins",
        ],
    ),
];

/// The built-in taxonomy as configuration entries
pub fn default_entries() -> Vec<TaxonomyEntry> {
    DEFAULT_TAXONOMY
        .iter()
        .map(|(category, skills)| TaxonomyEntry {
            category: category.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}
