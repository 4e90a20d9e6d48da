//! Canned backend data, rebuilt on every start.

use chrono::{DateTime, Duration, Utc};

use crate::auth::hash_password;
use crate::backend::StoredAccount;
use crate::models::*;

/// Demo credentials, printed by `stagehub init`.
pub const DEMO_ACCOUNTS: &[(&str, &str, Role)] = &[
    ("jean.dupont@email.com", "student123", Role::Student),
    ("contact@techcorp.fr", "company123", Role::Company),
    ("admin@stagehub.fr", "adminadmin", Role::Admin),
];

fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// `login` is `(id, name, email, password)`.
fn account(
    login: (UserId, &str, &str, &str),
    role: Role,
    company_id: Option<CompanyId>,
    profile: Profile,
    created_at: DateTime<Utc>,
) -> StoredAccount {
    let (id, name, email, password) = login;
    StoredAccount {
        identity: Identity {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
        },
        password_hash: hash_password(password),
        profile,
        status: UserStatus::Active,
        company_id,
        created_at,
    }
}

pub fn accounts(now: DateTime<Utc>) -> Vec<StoredAccount> {
    let student_profile = |education: &str, field: &str, skills: &[&str], location: &str| Profile {
        education: Some(education.to_string()),
        field: Some(field.to_string()),
        skills: strings(skills),
        location: Some(location.to_string()),
        profile_completed: true,
        ..Profile::default()
    };

    vec![
        account(
            (1, "Jean Dupont", "jean.dupont@email.com", "student123"),
            Role::Student,
            None,
            Profile {
                bio: Some("Computer science student looking for a full stack internship.".to_string()),
                ..student_profile("Master 1 Informatique", "Computer Science", &["JavaScript", "React", "SQL"], "Paris, France")
            },
            days_ago(now, 30),
        ),
        account(
            (2, "TechCorp", "contact@techcorp.fr", "company123"),
            Role::Company,
            Some(1),
            Profile {
                website: Some("https://techcorp.fr".to_string()),
                sectors: strings(&["Technologie"]),
                location: Some("Paris, France".to_string()),
                profile_completed: true,
                ..Profile::default()
            },
            days_ago(now, 90),
        ),
        account(
            (3, "Marie Martin", "marie.martin@email.com", "student123"),
            Role::Student,
            None,
            Profile::default(),
            days_ago(now, 15),
        ),
        account(
            (4, "Digital Agency", "contact@digitalagency.fr", "company123"),
            Role::Company,
            Some(2),
            Profile {
                website: Some("https://digitalagency.fr".to_string()),
                sectors: strings(&["Marketing"]),
                location: Some("Lyon, France".to_string()),
                profile_completed: true,
                ..Profile::default()
            },
            days_ago(now, 10),
        ),
        account(
            (5, "Platform Admin", "admin@stagehub.fr", "adminadmin"),
            Role::Admin,
            None,
            Profile::default(),
            days_ago(now, 120),
        ),
        account(
            (6, "Marie Dubois", "marie.dubois@email.com", "student123"),
            Role::Student,
            None,
            student_profile("Master 2 Informatique", "Computer Science", &["React", "Node.js", "MongoDB"], "Paris, France"),
            days_ago(now, 20),
        ),
        account(
            (7, "Thomas Martin", "thomas.martin@email.com", "student123"),
            Role::Student,
            None,
            student_profile("Licence 3 Marketing", "Marketing", &["SEO", "Social Media", "Analytics"], "Lyon, France"),
            days_ago(now, 8),
        ),
        account(
            (8, "Sophie Bernard", "sophie.bernard@email.com", "student123"),
            Role::Student,
            None,
            student_profile("Master 1 Informatique", "Computer Science", &["JavaScript", "Vue.js", "Python"], "Paris, France"),
            days_ago(now, 45),
        ),
    ]
}

pub fn companies(now: DateTime<Utc>) -> Vec<Company> {
    vec![
        Company {
            id: 1,
            name: "TechCorp".to_string(),
            location: "Paris, France".to_string(),
            sectors: strings(&["Tech", "Web"]),
            employees_count: "50-100".to_string(),
            postings_count: 0,
            applications_count: 0,
            status: CompanyStatus::Verified,
            email: "contact@techcorp.fr".to_string(),
            phone: Some("01 23 45 67 89".to_string()),
            website: Some("https://techcorp.fr".to_string()),
            description: "Startup building web products for retail and logistics.".to_string(),
            created_at: days_ago(now, 90),
        },
        Company {
            id: 2,
            name: "Digital Agency".to_string(),
            location: "Lyon, France".to_string(),
            sectors: strings(&["Marketing", "Digital"]),
            employees_count: "20-50".to_string(),
            postings_count: 0,
            applications_count: 0,
            status: CompanyStatus::Pending,
            email: "contact@digitalagency.fr".to_string(),
            phone: Some("04 12 34 56 78".to_string()),
            website: Some("https://digitalagency.fr".to_string()),
            description: "Digital agency running social and search campaigns.".to_string(),
            created_at: days_ago(now, 10),
        },
        Company {
            id: 3,
            name: "DataLab".to_string(),
            location: "Bordeaux, France".to_string(),
            sectors: strings(&["Data", "Consulting"]),
            employees_count: "10-20".to_string(),
            postings_count: 0,
            applications_count: 0,
            status: CompanyStatus::Verified,
            email: "jobs@datalab.fr".to_string(),
            phone: None,
            website: Some("https://datalab.fr".to_string()),
            description: "Analytics consultancy for public sector clients.".to_string(),
            created_at: days_ago(now, 200),
        },
    ]
}

/// `place` is `(location, duration)`; `published` is `(status, created_at)`.
fn posting(
    id: PostingId,
    title: &str,
    company: (&str, CompanyId),
    place: (&str, &str),
    description: &str,
    tags: &[&str],
    published: (PostingStatus, DateTime<Utc>),
) -> Posting {
    let (location, duration) = place;
    let (status, created_at) = published;
    Posting {
        id,
        title: title.to_string(),
        company: company.0.to_string(),
        company_id: Some(company.1),
        location: location.to_string(),
        duration: duration.to_string(),
        description: description.to_string(),
        tags: strings(tags),
        status,
        created_at,
        applications_count: 0,
        salary: None,
        start_date: None,
        missions: Vec::new(),
        requirements: Vec::new(),
        benefits: Vec::new(),
        positions: 1,
    }
}

/// Newest first, which is the catalog's source order.
pub fn postings(now: DateTime<Utc>) -> Vec<Posting> {
    let techcorp = ("TechCorp", 1);
    let agency = ("Digital Agency", 2);
    let datalab = ("DataLab", 3);

    let mut full_stack = posting(
        1,
        "Full Stack Developer Internship",
        techcorp,
        ("Paris, France", "6 months"),
        "Build web applications with React and Node.js alongside the product team.",
        &["React", "Node.js", "JavaScript"],
        (PostingStatus::Active, days_ago(now, 7)),
    );
    full_stack.salary = Some("1200 EUR/month".to_string());
    full_stack.missions = strings(&["Ship features end to end", "Write tests"]);
    full_stack.requirements = strings(&["React basics", "Git"]);
    full_stack.positions = 2;

    vec![
        posting(
            5,
            "UX Design Internship",
            agency,
            ("Lyon, France", "5 months"),
            "Design client-facing interfaces and run user tests.",
            &["Figma", "UX", "Design"],
            (PostingStatus::Draft, days_ago(now, 1)),
        ),
        posting(
            4,
            "Mobile Developer Internship",
            techcorp,
            ("Remote", "3 months"),
            "Prototype a mobile companion app.",
            &["Flutter", "Mobile"],
            (PostingStatus::Pending, days_ago(now, 2)),
        ),
        posting(
            3,
            "Data Analyst Internship",
            datalab,
            ("Bordeaux, France", "6 months"),
            "Clean, model and visualise public datasets.",
            &["Python", "SQL", "Data"],
            (PostingStatus::Active, days_ago(now, 4)),
        ),
        posting(
            2,
            "Digital Marketing Internship",
            agency,
            ("Lyon, France", "4 months"),
            "Run social media campaigns and track SEO performance.",
            &["SEO", "Social Media", "Marketing"],
            (PostingStatus::Active, days_ago(now, 5)),
        ),
        full_stack,
    ]
}

fn applicant(accounts: &[StoredAccount], id: UserId) -> Applicant {
    accounts
        .iter()
        .find(|a| a.identity.id == id)
        .map(StoredAccount::applicant)
        .unwrap_or_else(|| Applicant {
            id,
            name: format!("User {}", id),
            email: String::new(),
            education: None,
            skills: Vec::new(),
        })
}

pub fn applications(now: DateTime<Utc>, accounts: &[StoredAccount]) -> Vec<Application> {
    let app = |id, posting_id, title: &str, user, letter: &str, status, days| Application {
        id,
        posting_id,
        posting_title: title.to_string(),
        applicant: applicant(accounts, user),
        cover_letter: letter.to_string(),
        status,
        applied_at: days_ago(now, days),
        reason: None,
    };

    let mut rejected = app(
        5,
        2,
        "Digital Marketing Internship",
        1,
        "I would like to broaden my skills towards marketing.",
        ApplicationStatus::Rejected,
        3,
    );
    rejected.reason = Some("Profile does not match the marketing focus.".to_string());

    vec![
        app(
            1,
            1,
            "Full Stack Developer Internship",
            6,
            "I am very motivated by this opportunity.",
            ApplicationStatus::Pending,
            2,
        ),
        app(
            2,
            2,
            "Digital Marketing Internship",
            7,
            "Passionate about digital marketing.",
            ApplicationStatus::Pending,
            1,
        ),
        app(
            3,
            1,
            "Full Stack Developer Internship",
            8,
            "My web development experience fits your stack.",
            ApplicationStatus::Accepted,
            5,
        ),
        app(
            4,
            3,
            "Data Analyst Internship",
            1,
            "I enjoy SQL and would love to work on public data.",
            ApplicationStatus::Pending,
            0,
        ),
        rejected,
    ]
}

fn message(text: &str, sender: Sender, at: DateTime<Utc>) -> Message {
    Message {
        text: text.to_string(),
        sender,
        timestamp: at,
    }
}

fn conversation(
    id: ConversationId,
    student: (UserId, &str),
    company: (CompanyId, &str),
    posting_title: &str,
    unread_count: u32,
    messages: Vec<Message>,
) -> Conversation {
    let (last_message, last_message_at) = messages
        .last()
        .map(|m| (m.text.clone(), m.timestamp))
        .unwrap_or_default();
    Conversation {
        id,
        student_id: student.0,
        company_id: Some(company.0),
        student_name: student.1.to_string(),
        company_name: company.1.to_string(),
        posting_title: posting_title.to_string(),
        last_message,
        last_message_at,
        unread_count,
        messages,
    }
}

pub fn conversations(now: DateTime<Utc>) -> Vec<Conversation> {
    let hours_ago = |h: i64| now - Duration::hours(h);
    vec![
        conversation(
            1,
            (1, "Jean Dupont"),
            (1, "TechCorp"),
            "Full Stack Developer Internship",
            1,
            vec![
                message("Hello, I applied to your internship offer.", Sender::Student, hours_ago(24)),
                message("Hello! Thanks for applying, we received it.", Sender::Company, hours_ago(12)),
                message("Thanks for your application!", Sender::Company, hours_ago(1)),
            ],
        ),
        conversation(
            2,
            (1, "Jean Dupont"),
            (2, "Digital Agency"),
            "Digital Marketing Internship",
            0,
            vec![
                message("Hello, I am interested in your offer.", Sender::Student, hours_ago(48)),
                message(
                    "Hello! Your profile interests us. When are you available for an interview?",
                    Sender::Company,
                    hours_ago(2),
                ),
            ],
        ),
        conversation(
            3,
            (6, "Marie Dubois"),
            (1, "TechCorp"),
            "Full Stack Developer Internship",
            2,
            vec![
                message("Hello, could you tell me more about the internship?", Sender::Student, hours_ago(24)),
                message("Hello Marie, of course! What would you like to know?", Sender::Company, hours_ago(12)),
                message("Thanks for the quick answer!", Sender::Student, hours_ago(0)),
            ],
        ),
    ]
}

pub fn activities(now: DateTime<Utc>) -> Vec<Activity> {
    let hours_ago = |h: i64| now - Duration::hours(h);
    vec![
        Activity {
            kind: ActivityKind::User,
            message: "New user registered: Marie Martin".to_string(),
            timestamp: hours_ago(1),
        },
        Activity {
            kind: ActivityKind::Posting,
            message: "New posting submitted: Mobile Developer Internship".to_string(),
            timestamp: hours_ago(2),
        },
        Activity {
            kind: ActivityKind::Application,
            message: "New application to Data Analyst Internship".to_string(),
            timestamp: hours_ago(3),
        },
    ]
}
