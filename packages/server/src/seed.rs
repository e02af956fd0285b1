use chrono::Utc;
use common::store::MemoryStore;
use sea_orm::*;
use tracing::info;

use crate::entity::{problem, test_case};

struct SampleProblem {
    title: &'static str,
    slug: &'static str,
    difficulty: &'static str,
    description: &'static str,
    /// `(input, expected_output, is_hidden)`
    test_cases: &'static [(&'static str, &'static str, bool)],
}

const SAMPLE_PROBLEMS: &[SampleProblem] = &[
    SampleProblem {
        title: "Sum of Two Numbers",
        slug: "sum-of-two-numbers",
        difficulty: "Easy",
        description: "Read two integers separated by a space and print their sum.",
        test_cases: &[("2 3", "5", false), ("10 20", "30", false), ("-7 7", "0", true)],
    },
    SampleProblem {
        title: "Reverse a String",
        slug: "reverse-a-string",
        difficulty: "Easy",
        description: "Read a single line and print it reversed.",
        test_cases: &[
            ("hello", "olleh", false),
            ("abc", "cba", false),
            ("racecar", "racecar", true),
        ],
    },
];

/// Insert the sample problems that are not present yet, matched by slug.
pub async fn seed_problems(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for sample in SAMPLE_PROBLEMS {
        let exists = problem::Entity::find()
            .filter(problem::Column::Slug.eq(sample.slug))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let txn = db.begin().await?;
        let model = problem::ActiveModel {
            title: Set(sample.title.to_string()),
            slug: Set(sample.slug.to_string()),
            description: Set(sample.description.to_string()),
            difficulty: Set(sample.difficulty.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for &(input, expected_output, is_hidden) in sample.test_cases {
            test_case::ActiveModel {
                problem_id: Set(model.id),
                input: Set(input.to_string()),
                expected_output: Set(expected_output.to_string()),
                is_hidden: Set(is_hidden),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;
        inserted += 1;
    }

    info!(inserted, "Sample problems seeded");
    Ok(())
}

/// Load the sample problems into an in-memory store.
pub async fn seed_memory(store: &MemoryStore) {
    for sample in SAMPLE_PROBLEMS {
        let problem = store
            .add_described_problem(
                sample.title,
                sample.slug,
                sample.difficulty,
                sample.description,
            )
            .await;
        for &(input, expected_output, is_hidden) in sample.test_cases {
            store
                .add_test_case(problem.id, input, expected_output, is_hidden)
                .await;
        }
    }
    info!(count = SAMPLE_PROBLEMS.len(), "Sample problems loaded into memory");
}
