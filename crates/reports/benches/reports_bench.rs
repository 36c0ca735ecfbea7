use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use reports::{Sheet, StudentLookup};
use store::{Mark, RecordId, Student};

const SUBJECTS: [&str; 5] = ["Mathematics", "Science", "English", "History", "Geography"];

/// Build N students with one mark per subject each.
fn populate(n: usize) -> (Vec<Student>, Vec<Mark>) {
    let now = Utc::now();
    let students: Vec<Student> = (0..n)
        .map(|i| Student {
            id: RecordId::new(),
            name: format!("Student {i}"),
            email: format!("student{i}@student.com"),
            student_id: format!("STU{i:03}"),
            created_at: now,
            updated_at: now,
        })
        .collect();

    let marks = students
        .iter()
        .flat_map(|s| {
            SUBJECTS.iter().enumerate().map(move |(j, subject)| Mark {
                id: RecordId::new(),
                student_id: s.id,
                subject: subject.to_string(),
                marks: 70.0 + j as f64,
                max_marks: 100.0,
                semester: "Fall 2023".to_string(),
                academic_year: "2023-2024".to_string(),
                teacher_id: None,
                created_at: now,
                updated_at: now,
            })
        })
        .collect();

    (students, marks)
}

fn bench_all_marks_workbook(c: &mut Criterion) {
    let mut group = c.benchmark_group("reports/all_marks_workbook");

    for n in [10, 100, 1000] {
        let (students, marks) = populate(n);
        let lookup = StudentLookup::new(students);

        group.bench_with_input(BenchmarkId::from_parameter(n), &marks, |b, marks| {
            b.iter(|| Sheet::all_marks(marks, &lookup).to_xlsx().unwrap());
        });
    }

    group.finish();
}

fn bench_student_workbook(c: &mut Criterion) {
    let (students, marks) = populate(1);

    c.bench_function("reports/student_workbook", |b| {
        b.iter(|| {
            Sheet::student_marks(&students[0], &marks)
                .to_xlsx()
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_all_marks_workbook, bench_student_workbook);
criterion_main!(benches);
