//! Database seeders for built-in data
//!
//! Populates the course catalog with the fixed curriculum list. Runs on
//! every startup so new catalog entries are picked up without a migration.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::planner::steop;

/// Seed the built-in course catalog (upserts by course code).
pub async fn seed_course_catalog(pool: &SqlitePool) -> Result<()> {
    info!("Seeding course catalog...");

    // Format: (code, title, ects, semester, faculty, course_type, language, prerequisites)
    let catalog: Vec<(&str, &str, f64, &str, &str, &str, &str, &[&str])> = vec![
        (
            "VL.ALGEBRA",
            "Algebra und Diskrete Mathematik",
            6.0,
            "WS",
            "Informatik",
            "VL",
            "de",
            &[],
        ),
        ("UE.ALGEBRA", "Übung Algebra und Diskrete Mathematik", 3.0, "WS", "Informatik", "UE", "de", &[]),
        ("VL.ANALYSIS", "Analysis für Informatik", 6.0, "SS", "Informatik", "VL", "de", &[]),
        ("UE.ANALYSIS", "Übung Analysis für Informatik", 3.0, "SS", "Informatik", "UE", "de", &[]),
        (
            "VL.EINFUEHRUNG.INFORMATIK",
            "Einführung in die Informatik",
            3.0,
            "WS",
            "Informatik",
            "VL",
            "de",
            &[],
        ),
        (
            "UE.EINFUEHRUNG.INFORMATIK",
            "Übung Einführung in die Informatik",
            3.0,
            "WS",
            "Informatik",
            "UE",
            "de",
            &[],
        ),
        ("VL.PROGRAMMIERUNG.1", "Programmierung 1", 4.5, "WS", "Informatik", "VL", "de", &[]),
        ("UE.PROGRAMMIERUNG.1", "Übung Programmierung 1", 4.5, "WS", "Informatik", "UE", "de", &[]),
        (
            "VU.PROGRAMMIERUNG.2",
            "Programmierung 2",
            6.0,
            "SS",
            "Informatik",
            "VU",
            "de",
            &["VL.PROGRAMMIERUNG.1"],
        ),
        (
            "VL.TECHNISCHE.GRUNDLAGEN",
            "Technische Grundlagen der Informatik",
            4.5,
            "WS",
            "Informatik",
            "VL",
            "de",
            &[],
        ),
        (
            "UE.TECHNISCHE.GRUNDLAGEN",
            "Übung Technische Grundlagen der Informatik",
            1.5,
            "WS",
            "Informatik",
            "UE",
            "de",
            &[],
        ),
        (
            "VL.MATHEMATIK.DISKRET",
            "Diskrete Strukturen",
            3.0,
            "SS",
            "Informatik",
            "VL",
            "de",
            &[],
        ),
        (
            "UE.MATHEMATIK.DISKRET",
            "Übung Diskrete Strukturen",
            1.5,
            "SS",
            "Informatik",
            "UE",
            "de",
            &[],
        ),
        (
            "VU.ALGORITHMEN",
            "Algorithmen und Datenstrukturen",
            6.0,
            "SS",
            "Informatik",
            "VU",
            "de",
            &["VL.PROGRAMMIERUNG.1", "VL.ALGEBRA"],
        ),
        (
            "VL.DATENBANKEN",
            "Datenbanksysteme",
            6.0,
            "WS",
            "Informatik",
            "VL",
            "de",
            &["VU.ALGORITHMEN"],
        ),
        (
            "VU.BETRIEBSSYSTEME",
            "Betriebssysteme",
            6.0,
            "WS",
            "Informatik",
            "VU",
            "de",
            &["VL.TECHNISCHE.GRUNDLAGEN", "VU.PROGRAMMIERUNG.2"],
        ),
        (
            "VU.VERTEILTE.SYSTEME",
            "Verteilte Systeme",
            6.0,
            "SS",
            "Informatik",
            "VU",
            "en",
            &["VU.BETRIEBSSYSTEME"],
        ),
        (
            "PR.SOFTWAREPRAKTIKUM",
            "Softwareentwicklungspraktikum",
            9.0,
            "SS",
            "Informatik",
            "PR",
            "de",
            &["VU.PROGRAMMIERUNG.2"],
        ),
        (
            "SE.WISSENSCHAFTLICHES.ARBEITEN",
            "Seminar Wissenschaftliches Arbeiten",
            3.0,
            "WS",
            "Informatik",
            "SE",
            "en",
            &[],
        ),
        (
            "VL.STATISTIK",
            "Statistik und Wahrscheinlichkeitstheorie",
            4.5,
            "WS",
            "Mathematik",
            "VL",
            "de",
            &["VL.ANALYSIS"],
        ),
    ];

    let now = chrono::Utc::now().to_rfc3339();
    let mut seeded = 0usize;

    for (code, title, ects, semester, faculty, course_type, language, prerequisites) in catalog {
        let flags = steop::classify(code);
        let prereq_json = serde_json::to_string(prerequisites)?;
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO courses
                (id, course_code, title, ects, semester, faculty, course_type,
                 language, prerequisites, is_steop_required, is_steop_allowed,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(course_code) DO UPDATE SET
                title = excluded.title,
                ects = excluded.ects,
                semester = excluded.semester,
                faculty = excluded.faculty,
                course_type = excluded.course_type,
                language = excluded.language,
                prerequisites = excluded.prerequisites,
                is_steop_required = excluded.is_steop_required,
                is_steop_allowed = excluded.is_steop_allowed,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(code)
        .bind(title)
        .bind(ects)
        .bind(semester)
        .bind(faculty)
        .bind(course_type)
        .bind(language)
        .bind(&prereq_json)
        .bind(flags.required)
        .bind(flags.allowed)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        seeded += 1;
    }

    info!("Seeded {} catalog courses", seeded);
    Ok(())
}
