use dotenvy::dotenv;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::env;

fn is_dry_run() -> bool {
    !std::env::args().any(|a| a == "--apply")
}

struct DemoClass {
    name: &'static str,
    teacher: &'static str,
    description: &'static str,
}

struct DemoStudent {
    name: &'static str,
    class_name: &'static str,
    email: &'static str,
    status: &'static str,
}

const CLASSES: &[DemoClass] = &[
    DemoClass { name: "Mathematics 101", teacher: "Dr. Sarah Johnson", description: "Introduction to Algebra and Geometry" },
    DemoClass { name: "English Literature", teacher: "Prof. Michael Brown", description: "Classic and Modern Literature" },
    DemoClass { name: "Computer Science", teacher: "Dr. Emily Chen", description: "Programming Fundamentals" },
    DemoClass { name: "Physics 201", teacher: "Dr. James Wilson", description: "Advanced Physics Concepts" },
];

const STUDENTS: &[DemoStudent] = &[
    DemoStudent { name: "Amina Hassan", class_name: "Mathematics 101", email: "amina@example.com", status: "Active" },
    DemoStudent { name: "Yusuf Ahmed", class_name: "Mathematics 101", email: "yusuf@example.com", status: "Active" },
    DemoStudent { name: "Fatima Ali", class_name: "English Literature", email: "fatima@example.com", status: "Active" },
    DemoStudent { name: "Omar Ibrahim", class_name: "Computer Science", email: "omar@example.com", status: "Active" },
    DemoStudent { name: "Zainab Mohammed", class_name: "Physics 201", email: "zainab@example.com", status: "Inactive" },
    DemoStudent { name: "Ali Hassan", class_name: "Mathematics 101", email: "ali@example.com", status: "Active" },
    DemoStudent { name: "Maryam Osman", class_name: "English Literature", email: "maryam@example.com", status: "Active" },
    DemoStudent { name: "Ibrahim Yusuf", class_name: "Computer Science", email: "ibrahim@example.com", status: "Active" },
];

#[derive(Debug, Deserialize)]
struct StudentRow {
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let base_url = env::var("API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
    let base_url = base_url.trim_end_matches('/');
    let client = Client::new();
    let dry_run = is_dry_run();

    let mut classes_created = 0;

    for class in CLASSES {
        if dry_run {
            println!("[DRY RUN] Would create class {} ({})", class.name, class.teacher);
            classes_created += 1;
            continue;
        }

        let res = client
            .post(format!("{}/classes", base_url))
            .json(&json!({
                "name": class.name,
                "teacher": class.teacher,
                "description": class.description,
            }))
            .send()
            .await?;

        if res.status() == StatusCode::CONFLICT {
            println!("Class {} already exists, skipping", class.name);
            continue;
        }
        res.error_for_status()?;
        println!("Created class {}", class.name);
        classes_created += 1;
    }

    println!("Classes created: {} / {}", classes_created, CLASSES.len());

    let mut students_created = 0;

    for student in STUDENTS {
        if dry_run {
            println!(
                "[DRY RUN] Would enroll {} in {} ({})",
                student.name, student.class_name, student.status
            );
            students_created += 1;
            continue;
        }

        let enrolled = fetch_enrolled(&client, base_url, student.class_name).await?;
        if enrolled.iter().any(|s| s.name == student.name) {
            println!("{} already enrolled in {}, skipping", student.name, student.class_name);
            continue;
        }

        client
            .post(format!("{}/students", base_url))
            .json(&json!({
                "name": student.name,
                "class_name": student.class_name,
                "email": student.email,
                "status": student.status,
            }))
            .send()
            .await?
            .error_for_status()?;
        println!("Enrolled {} in {}", student.name, student.class_name);
        students_created += 1;
    }

    println!("Students created: {} / {}", students_created, STUDENTS.len());

    Ok(())
}

async fn fetch_enrolled(
    client: &Client,
    base_url: &str,
    class_name: &str,
) -> Result<Vec<StudentRow>, Box<dyn std::error::Error>> {
    let students = client
        .get(format!("{}/students", base_url))
        .query(&[("class", class_name)])
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<StudentRow>>()
        .await?;

    Ok(students)
}
