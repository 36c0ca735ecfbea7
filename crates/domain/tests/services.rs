//! Integration tests for the gradebook services.
//!
//! Every service shares one in-memory store, the way the server wires them.

use chrono::Duration;
use domain::{
    AddMarkRequest, AddStudentRequest, AuthService, DashboardService, DomainError, LoginRequest,
    MarkService, PasswordHasher, Principal, RegisterRequest, StudentService, TokenIssuer,
    UpdateMarkRequest, UpdateStudentRequest,
};
use serde_json::json;
use store::{
    InMemorySchoolStore, MarkQuery, NewUser, RecordId, Role, SchoolStore, SchoolStoreExt, Student,
};

const DEFAULT_PASSWORD: &str = "admin123";

struct Services {
    store: InMemorySchoolStore,
    auth: AuthService<InMemorySchoolStore>,
    students: StudentService<InMemorySchoolStore>,
    marks: MarkService<InMemorySchoolStore>,
    dashboard: DashboardService<InMemorySchoolStore>,
}

/// Helper to wire every service over one store, with a cheap bcrypt cost
fn create_services() -> Services {
    let store = InMemorySchoolStore::new();
    let hasher = PasswordHasher::new(4);
    let tokens = TokenIssuer::new("test-secret", Duration::hours(24));

    Services {
        auth: AuthService::new(store.clone(), hasher, tokens),
        students: StudentService::new(store.clone(), hasher, DEFAULT_PASSWORD),
        marks: MarkService::new(store.clone()),
        dashboard: DashboardService::new(store.clone()),
        store,
    }
}

fn principal(role: Role, email: &str) -> Principal {
    Principal {
        id: RecordId::new(),
        email: email.to_string(),
        role,
    }
}

fn add_student_request(name: &str, email: &str, code: &str) -> AddStudentRequest {
    AddStudentRequest {
        name: name.to_string(),
        email: email.to_string(),
        student_id: code.to_string(),
    }
}

fn add_mark_request(student: &Student, subject: &str, marks: f64, max: f64) -> AddMarkRequest {
    AddMarkRequest {
        student_id: student.id.to_string(),
        subject: subject.to_string(),
        marks: Some(json!(marks)),
        max_marks: Some(json!(max)),
        semester: "Fall 2023".to_string(),
        academic_year: "2023-2024".to_string(),
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

mod auth_flow {
    use super::*;

    #[tokio::test]
    async fn register_then_login_round_trips_identity() {
        let services = create_services();

        let user = services
            .auth
            .register(RegisterRequest {
                name: "Sarah Johnson".to_string(),
                email: "sarah.johnson@school.com".to_string(),
                password: "teacher123".to_string(),
                role: "teacher".to_string(),
            })
            .await
            .unwrap();
        assert!(user.password_hash.starts_with("$2"));

        let outcome = services
            .auth
            .login(login("sarah.johnson@school.com", "teacher123"))
            .await
            .unwrap();
        assert_eq!(outcome.user.id, user.id);

        let principal = services.auth.authenticate(&outcome.token).unwrap();
        assert_eq!(principal.id, user.id);
        assert_eq!(principal.role, Role::Teacher);

        let me = services.auth.me(&principal).await.unwrap();
        assert_eq!(me.email, "sarah.johnson@school.com");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let services = create_services();
        let request = RegisterRequest {
            name: "Admin".to_string(),
            email: "admin@school.com".to_string(),
            password: "admin123".to_string(),
            role: "admin".to_string(),
        };

        services.auth.register(request.clone()).await.unwrap();
        let err = services.auth.register(request).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(msg) if msg == "User already exists"));
    }

    #[tokio::test]
    async fn register_rejects_unknown_role() {
        let services = create_services();
        let err = services
            .auth
            .register(RegisterRequest {
                name: "Eve".to_string(),
                email: "eve@school.com".to_string(),
                password: "secret1".to_string(),
                role: "principal".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(errors) if errors[0].field == "role"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let services = create_services();
        services
            .auth
            .register(RegisterRequest {
                name: "Admin".to_string(),
                email: "admin@school.com".to_string(),
                password: "admin123".to_string(),
                role: "admin".to_string(),
            })
            .await
            .unwrap();

        let wrong = services
            .auth
            .login(login("admin@school.com", "wrong-password"))
            .await
            .unwrap_err();
        let unknown = services
            .auth
            .login(login("nobody@school.com", "admin123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, DomainError::InvalidCredentials));
        assert!(matches!(unknown, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn plaintext_password_is_migrated_on_login() {
        let services = create_services();
        let legacy = services
            .store
            .insert_user(NewUser {
                name: "Legacy Teacher".to_string(),
                email: "legacy@school.com".to_string(),
                password_hash: "teacher123".to_string(),
                role: Role::Teacher,
            })
            .await
            .unwrap();

        services
            .auth
            .login(login("legacy@school.com", "teacher123"))
            .await
            .unwrap();

        let stored = services.store.find_user(legacy.id).await.unwrap().unwrap();
        assert!(domain::auth::is_bcrypt_hash(&stored.password_hash));

        // The migrated hash still accepts the same password
        services
            .auth
            .login(login("legacy@school.com", "teacher123"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_password_migration_still_logs_in() {
        let store = InMemorySchoolStore::new();
        // bcrypt only accepts costs up to 31, so re-hashing fails
        let auth = AuthService::new(
            store.clone(),
            PasswordHasher::new(32),
            TokenIssuer::new("test-secret", Duration::hours(24)),
        );
        let legacy = store
            .insert_user(NewUser {
                name: "Legacy Admin".to_string(),
                email: "legacy.admin@school.com".to_string(),
                password_hash: "admin123".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        let outcome = auth
            .login(login("legacy.admin@school.com", "admin123"))
            .await
            .unwrap();
        assert_eq!(outcome.user.id, legacy.id);

        let stored = store.find_user(legacy.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "admin123");
    }
}

mod students {
    use super::*;

    #[tokio::test]
    async fn add_provisions_a_student_login() {
        let services = create_services();

        let student = services
            .students
            .add(add_student_request("Alice Brown", "alice@student.com", "STU001"))
            .await
            .unwrap();
        assert_eq!(student.student_id, "STU001");

        let outcome = services
            .auth
            .login(login("alice@student.com", DEFAULT_PASSWORD))
            .await
            .unwrap();
        assert_eq!(outcome.user.role, Role::Student);
    }

    #[tokio::test]
    async fn duplicate_email_or_code_conflicts() {
        let services = create_services();
        services
            .students
            .add(add_student_request("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();

        for request in [
            add_student_request("Other", "alice@student.com", "STU009"),
            add_student_request("Other", "other@student.com", "STU001"),
        ] {
            let err = services.students.add(request).await.unwrap_err();
            assert!(matches!(
                err,
                DomainError::Conflict(msg) if msg == "Student with this email or ID already exists"
            ));
        }
        assert_eq!(services.students.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn existing_login_is_left_alone() {
        let services = create_services();
        services
            .store
            .insert_user(NewUser {
                name: "Bob".to_string(),
                email: "bob@student.com".to_string(),
                password_hash: "bob-own-password".to_string(),
                role: Role::Student,
            })
            .await
            .unwrap();

        services
            .students
            .add(add_student_request("Bob", "bob@student.com", "STU002"))
            .await
            .unwrap();

        assert_eq!(services.store.count_users(None).await.unwrap(), 1);
        services
            .auth
            .login(login("bob@student.com", "bob-own-password"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn email_change_renames_the_login() {
        let services = create_services();
        let student = services
            .students
            .add(add_student_request("Carol", "carol@student.com", "STU003"))
            .await
            .unwrap();

        let updated = services
            .students
            .update(
                student.id,
                UpdateStudentRequest {
                    email: Some("carol.davis@student.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Carol");
        assert_eq!(updated.email, "carol.davis@student.com");

        assert!(
            services
                .store
                .find_user_by_email("carol@student.com")
                .await
                .unwrap()
                .is_none()
        );
        services
            .auth
            .login(login("carol.davis@student.com", DEFAULT_PASSWORD))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_missing_student_is_not_found() {
        let services = create_services();
        let err = services
            .students
            .update(RecordId::new(), UpdateStudentRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Student", .. }));
    }

    #[tokio::test]
    async fn delete_removes_marks_and_login() {
        let services = create_services();
        let teacher = principal(Role::Teacher, "john.smith@school.com");
        let student = services
            .students
            .add(add_student_request("David", "david@student.com", "STU004"))
            .await
            .unwrap();
        services
            .marks
            .add(&teacher, add_mark_request(&student, "History", 70.0, 100.0))
            .await
            .unwrap();

        services.students.delete(student.id).await.unwrap();

        assert_eq!(
            services
                .store
                .count_marks(MarkQuery::for_student(student.id))
                .await
                .unwrap(),
            0
        );
        assert!(
            services
                .store
                .find_user_by_email("david@student.com")
                .await
                .unwrap()
                .is_none()
        );
        assert!(matches!(
            services.students.delete(student.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    async fn insert_teacher(services: &Services, email: &str) -> store::User {
        services
            .store
            .insert_user(NewUser {
                name: "John Smith".to_string(),
                email: email.to_string(),
                password_hash: "teacher123".to_string(),
                role: Role::Teacher,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn delete_leaves_staff_login_sharing_the_email() {
        let services = create_services();
        let teacher = insert_teacher(&services, "john.smith@school.com").await;
        let student = services
            .students
            .add(add_student_request("John Smith", "john.smith@school.com", "STU010"))
            .await
            .unwrap();

        services.students.delete(student.id).await.unwrap();

        let kept = services
            .store
            .find_user_by_email("john.smith@school.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.id, teacher.id);
        assert_eq!(kept.role, Role::Teacher);
        services
            .auth
            .login(login("john.smith@school.com", "teacher123"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn email_change_leaves_staff_login_sharing_the_email() {
        let services = create_services();
        let teacher = insert_teacher(&services, "john.smith@school.com").await;
        let student = services
            .students
            .add(add_student_request("John Smith", "john.smith@school.com", "STU011"))
            .await
            .unwrap();

        services
            .students
            .update(
                student.id,
                UpdateStudentRequest {
                    email: Some("john.s@student.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let kept = services.store.find_user(teacher.id).await.unwrap().unwrap();
        assert_eq!(kept.email, "john.smith@school.com");
        assert!(
            services
                .store
                .find_user_by_email("john.s@student.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn students_may_only_look_up_their_own_email() {
        let services = create_services();
        services
            .students
            .add(add_student_request("Emma", "emma@student.com", "STU005"))
            .await
            .unwrap();

        let emma = principal(Role::Student, "emma@student.com");
        let found = services
            .students
            .get_by_email(&emma, "emma@student.com")
            .await
            .unwrap();
        assert_eq!(found.student_id, "STU005");

        let other = principal(Role::Student, "frank@student.com");
        assert!(matches!(
            services
                .students
                .get_by_email(&other, "emma@student.com")
                .await,
            Err(DomainError::Forbidden)
        ));
    }
}

mod marks {
    use super::*;

    #[tokio::test]
    async fn add_stamps_teacher_and_rejects_duplicates() {
        let services = create_services();
        let teacher = principal(Role::Teacher, "john.smith@school.com");
        let student = services
            .students
            .add(add_student_request("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();

        let mark = services
            .marks
            .add(&teacher, add_mark_request(&student, "Mathematics", 85.0, 100.0))
            .await
            .unwrap();
        assert_eq!(mark.teacher_id, Some(teacher.id));
        assert_eq!(mark.student_id, student.id);

        let err = services
            .marks
            .add(&teacher, add_mark_request(&student, "Mathematics", 90.0, 100.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // Same subject in another semester is a separate entry
        let mut spring = add_mark_request(&student, "Mathematics", 90.0, 100.0);
        spring.semester = "Spring 2024".to_string();
        services.marks.add(&teacher, spring).await.unwrap();

        assert_eq!(services.marks.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn add_for_missing_student_is_not_found() {
        let services = create_services();
        let teacher = principal(Role::Teacher, "john.smith@school.com");
        let mut request = AddMarkRequest {
            subject: "Science".to_string(),
            marks: Some(json!(50)),
            max_marks: Some(json!(100)),
            semester: "Fall 2023".to_string(),
            academic_year: "2023-2024".to_string(),
            ..Default::default()
        };
        request.student_id = RecordId::new().to_string();

        let err = services.marks.add(&teacher, request).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Student", .. }));
    }

    #[tokio::test]
    async fn student_sees_only_own_marks() {
        let services = create_services();
        let teacher = principal(Role::Teacher, "john.smith@school.com");
        let alice = services
            .students
            .add(add_student_request("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();
        let bob = services
            .students
            .add(add_student_request("Bob", "bob@student.com", "STU002"))
            .await
            .unwrap();
        services
            .marks
            .add(&teacher, add_mark_request(&alice, "English", 78.0, 100.0))
            .await
            .unwrap();

        let as_alice = principal(Role::Student, "alice@student.com");
        let own = services.marks.for_student(&as_alice, alice.id).await.unwrap();
        assert_eq!(own.student.id, alice.id);
        assert_eq!(own.marks.len(), 1);

        assert!(matches!(
            services.marks.for_student(&as_alice, bob.id).await,
            Err(DomainError::Forbidden)
        ));

        // Staff can read anyone's marks
        let staff = services.marks.for_student(&teacher, bob.id).await.unwrap();
        assert!(staff.marks.is_empty());
    }

    #[tokio::test]
    async fn update_validates_and_applies() {
        let services = create_services();
        let teacher = principal(Role::Teacher, "john.smith@school.com");
        let student = services
            .students
            .add(add_student_request("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();
        let mark = services
            .marks
            .add(&teacher, add_mark_request(&student, "Geography", 60.0, 100.0))
            .await
            .unwrap();

        let err = services
            .marks
            .update(
                mark.id,
                UpdateMarkRequest {
                    marks: Some(json!(60)),
                    max_marks: Some(json!(50)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let updated = services
            .marks
            .update(
                mark.id,
                UpdateMarkRequest {
                    marks: Some(json!("45")),
                    max_marks: Some(json!(50)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.marks, 45.0);
        assert_eq!(updated.max_marks, 50.0);
        assert_eq!(updated.subject, "Geography");

        services.marks.delete(mark.id).await.unwrap();
        assert!(matches!(
            services.marks.get(mark.id).await,
            Err(DomainError::NotFound { entity: "Mark", .. })
        ));
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn stats_cover_counts_and_average() {
        let services = create_services();
        let john = principal(Role::Teacher, "john.smith@school.com");
        let sarah = principal(Role::Teacher, "sarah.johnson@school.com");
        services
            .auth
            .register(RegisterRequest {
                name: "John Smith".to_string(),
                email: "john.smith@school.com".to_string(),
                password: "teacher123".to_string(),
                role: "teacher".to_string(),
            })
            .await
            .unwrap();

        let alice = services
            .students
            .add(add_student_request("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();
        let bob = services
            .students
            .add(add_student_request("Bob", "bob@student.com", "STU002"))
            .await
            .unwrap();

        for (teacher, student, subject, marks) in [
            (&john, &alice, "Mathematics", 80.0),
            (&john, &alice, "Science", 90.0),
            (&john, &bob, "Mathematics", 70.0),
            (&sarah, &bob, "English", 75.0),
        ] {
            services
                .marks
                .add(teacher, add_mark_request(student, subject, marks, 100.0))
                .await
                .unwrap();
        }

        let stats = services.dashboard.stats().await.unwrap();
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.total_teachers, 1);
        assert_eq!(stats.total_marks, 4);
        assert_eq!(stats.average_marks, 78.75);

        let john_stats = services.dashboard.teacher_stats(john.id).await.unwrap();
        assert_eq!(john_stats.students_handled, 2);
        assert_eq!(john_stats.marks_entries, 3);

        let idle = services
            .dashboard
            .teacher_stats(RecordId::new())
            .await
            .unwrap();
        assert_eq!(idle.marks_entries, 0);

        let teachers = services.dashboard.teachers().await.unwrap();
        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].email, "john.smith@school.com");
    }

    #[tokio::test]
    async fn empty_store_has_zero_average() {
        let services = create_services();
        let stats = services.dashboard.stats().await.unwrap();
        assert_eq!(stats.total_marks, 0);
        assert_eq!(stats.average_marks, 0.0);
        assert!(services.store.all_marks().await.unwrap().is_empty());
    }
}
