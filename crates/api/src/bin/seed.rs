//! Wipes the database and loads demo accounts, students and marks.

use api::Config;
use api::config::DB_RETRY_DELAY;
use domain::{
    AddStudentRequest, AuthService, DomainError, PasswordHasher, RegisterRequest, StudentService,
    TokenIssuer,
};
use rand::Rng;
use store::{NewMark, PostgresSchoolStore, RecordId, SchoolStore};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SUBJECTS: [&str; 5] = ["Mathematics", "Science", "English", "History", "Geography"];
const SEMESTERS: [&str; 2] = ["Fall 2023", "Spring 2024"];
const ACADEMIC_YEAR: &str = "2023-2024";

const STUDENTS: [(&str, &str, &str); 5] = [
    ("Alice Brown", "alice.brown@student.com", "STU001"),
    ("Bob Wilson", "bob.wilson@student.com", "STU002"),
    ("Carol Davis", "carol.davis@student.com", "STU003"),
    ("David Miller", "david.miller@student.com", "STU004"),
    ("Emma Garcia", "emma.garcia@student.com", "STU005"),
];

fn account(name: &str, email: &str, password: &str, role: &str) -> RegisterRequest {
    RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role: role.to_string(),
    }
}

async fn seed<S: SchoolStore + Clone>(store: S, config: &Config) -> Result<(), DomainError> {
    let hasher = PasswordHasher::new(config.bcrypt_cost);
    let auth = AuthService::new(
        store.clone(),
        hasher,
        TokenIssuer::new(&config.jwt_secret, config.jwt_ttl()),
    );
    let students = StudentService::new(store.clone(), hasher, "admin123");

    store.clear().await?;
    tracing::info!("cleared existing data");

    auth.register(account("Admin User", "admin@school.com", "admin123", "admin"))
        .await?;
    let john = auth
        .register(account(
            "John Smith",
            "john.smith@school.com",
            "teacher123",
            "teacher",
        ))
        .await?;
    let sarah = auth
        .register(account(
            "Sarah Johnson",
            "sarah.johnson@school.com",
            "teacher123",
            "teacher",
        ))
        .await?;

    let mut enrolled: Vec<RecordId> = Vec::with_capacity(STUDENTS.len());
    for (name, email, code) in STUDENTS {
        let student = students
            .add(AddStudentRequest {
                name: name.to_string(),
                email: email.to_string(),
                student_id: code.to_string(),
            })
            .await?;
        enrolled.push(student.id);
    }

    let mut recorded = 0;
    for (i, student_id) in enrolled.into_iter().enumerate() {
        let teacher_id = if i % 2 == 0 { john.id } else { sarah.id };
        for subject in SUBJECTS {
            for semester in SEMESTERS {
                let marks: u32 = rand::rng().random_range(70..=99);
                store
                    .insert_mark(NewMark {
                        student_id,
                        subject: subject.to_string(),
                        marks: f64::from(marks),
                        max_marks: 100.0,
                        semester: semester.to_string(),
                        academic_year: ACADEMIC_YEAR.to_string(),
                        teacher_id: Some(teacher_id),
                    })
                    .await?;
                recorded += 1;
            }
        }
    }

    tracing::info!(students = STUDENTS.len(), marks = recorded, "database seeded");
    println!("Sample login credentials:");
    println!("  Admin:     admin@school.com / admin123");
    println!("  Teacher 1: john.smith@school.com / teacher123");
    println!("  Teacher 2: sarah.johnson@school.com / teacher123");
    println!("Student logins (password admin123):");
    for (name, email, _) in STUDENTS {
        println!("  {name}: {email}");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let Some(url) = config.database_url.as_deref() else {
        tracing::error!("DATABASE_URL must be set to seed the database");
        std::process::exit(1);
    };

    let pool = store::connect_with_retry(url, config.db_connect_attempts, DB_RETRY_DELAY)
        .await
        .expect("failed to connect to database");
    let store = PostgresSchoolStore::new(pool);
    store.run_migrations().await.expect("migrations failed");

    seed(store, &config).await.expect("seeding failed");
}
