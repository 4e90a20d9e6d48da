mod auth;
mod backend;
mod config;
mod error;
mod filter;
mod models;
mod persist;
mod seed;
mod service;
mod storage;
mod store;
mod tui;
mod validate;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use backend::MockBackend;
use config::Config;
use filter::PostingFilter;
use models::{
    Application, ApplicationDecision, ApplicationForm, ApplicationId, CompanyId,
    CompanyOnboarding, Conversation, ConversationId, ModerationDecision, NewPosting, Posting,
    PostingId, ProfileUpdate, PublishMode, Role, Sender, SignUpForm, StudentOnboarding, UserId,
    UserStatus,
};
use persist::Persisted;
use storage::Storage;
use store::Stores;

#[derive(Parser)]
#[command(name = "stagehub")]
#[command(about = "Internship marketplace - browse offers, apply, and manage postings")]
struct Cli {
    /// Path to the local database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Simulated backend latency in milliseconds
    #[arg(long, global = true)]
    latency_ms: Option<u64>,

    /// Company publications wait for admin review
    #[arg(long, global = true)]
    require_review: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and print the demo accounts
    Init,

    /// Sign in
    Login {
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create a student or company account
    Register {
        name: String,

        email: String,

        #[arg(short, long)]
        password: String,

        /// Password confirmation (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,

        /// Account type (student, company)
        #[arg(short, long, default_value = "student")]
        role: String,
    },

    /// Sign out and forget the local session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List open internships
    List {
        /// Text in title, company or description
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        /// Skill or domain tag
        #[arg(short, long)]
        domain: Option<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show internship details
    Show {
        /// Posting ID
        id: PostingId,
    },

    /// Apply to an internship
    Apply {
        /// Posting ID
        id: PostingId,

        /// Cover letter
        #[arg(short, long)]
        letter: String,
    },

    /// Browse internships in a terminal UI
    Browse {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Manage favorite internships
    Favorite {
        #[command(subcommand)]
        command: FavoriteCommands,
    },

    /// View and edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// List your applications
    Applications,

    /// Withdraw a pending application
    Withdraw {
        /// Application ID
        id: ApplicationId,
    },

    /// Student conversations with companies
    Messages {
        #[command(subcommand)]
        command: MessageCommands,
    },

    /// Company dashboard
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Platform administration
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum FavoriteCommands {
    /// Save a posting
    Add { id: PostingId },

    /// Forget a posting
    Remove { id: PostingId },

    /// List saved postings
    List,

    /// Forget every saved posting
    Clear,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,

    /// Update individual fields
    Edit {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        bio: Option<String>,

        #[arg(long)]
        education: Option<String>,

        #[arg(long)]
        field: Option<String>,

        /// Comma-separated list
        #[arg(long, value_delimiter = ',')]
        skills: Option<Vec<String>>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        website: Option<String>,
    },

    /// Finish student onboarding
    CompleteStudent {
        #[arg(long)]
        bio: String,

        #[arg(long)]
        education: String,

        #[arg(long)]
        field: String,

        /// Comma-separated list
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,

        #[arg(long)]
        location: String,
    },

    /// Finish company onboarding
    CompleteCompany {
        #[arg(long)]
        website: String,

        /// Comma-separated list
        #[arg(long, value_delimiter = ',')]
        sectors: Vec<String>,

        /// At least 50 characters
        #[arg(long)]
        description: String,
    },

    /// Store a document (resume, cover letter) locally
    Upload { file: PathBuf },

    /// Show or export the stored document
    Document {
        /// Write the document to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MessageCommands {
    /// List your conversations
    List,

    /// Send a message in a conversation
    Send { id: ConversationId, text: String },

    /// Start a conversation with a company
    Start {
        company: String,

        /// Internship the conversation is about
        #[arg(short, long)]
        posting: String,

        text: String,
    },

    /// Read a conversation
    Read { id: ConversationId },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// List your postings
    Postings,

    /// Create a posting
    Post {
        title: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        duration: String,

        #[arg(long)]
        description: String,

        /// Comma-separated list
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        #[arg(long)]
        salary: Option<String>,

        #[arg(long)]
        start_date: Option<String>,

        #[arg(long, value_delimiter = ';')]
        missions: Vec<String>,

        #[arg(long, value_delimiter = ';')]
        requirements: Vec<String>,

        #[arg(long, value_delimiter = ';')]
        benefits: Vec<String>,

        #[arg(long)]
        positions: Option<u32>,

        /// Save without publishing
        #[arg(long)]
        draft: bool,
    },

    /// Close an active posting
    Close { id: PostingId },

    /// List applications received
    Applications,

    /// Accept an application
    Accept { id: ApplicationId },

    /// Reject an application
    Reject {
        id: ApplicationId,

        #[arg(short, long)]
        reason: Option<String>,
    },

    /// List conversations with students
    Messages,

    /// Reply in a conversation
    Reply { id: ConversationId, text: String },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Platform counters and recent activity
    Stats,

    /// List all users
    Users,

    /// Suspend a user
    Suspend { id: UserId },

    /// Reactivate a user
    Activate { id: UserId },

    /// Delete a user
    DeleteUser { id: UserId },

    /// List postings in every status
    Postings,

    /// Approve a posting awaiting review
    Approve { id: PostingId },

    /// Reject a posting awaiting review
    Reject { id: PostingId },

    /// Delete a posting
    DeletePosting { id: PostingId },

    /// List companies
    Companies,

    /// Mark a company as verified
    Verify { id: CompanyId },

    /// Suspend a company
    SuspendCompany { id: CompanyId },

    /// Create another administrator
    AddAdmin {
        name: String,

        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        confirm: Option<String>,
    },

    /// List administrators
    Admins,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stagehub=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Rehydrates the stored session and returns its token, checking the role
/// when one is required.
fn session_token(stores: &mut Stores, role: Option<Role>) -> Result<String> {
    stores
        .session
        .restore_session()
        .context("Not signed in. Run: stagehub login <email> --password <password>")?;
    let token = match role {
        Some(role) => stores
            .session
            .require_role(role)
            .with_context(|| format!("This command needs a {} account", role))?,
        None => stores.session.require_token()?,
    };
    Ok(token.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env()?.with_overrides(cli.db, cli.latency_ms, cli.require_review);
    let storage = Storage::open(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    let persisted = Persisted::new(Arc::new(storage));
    let backend = Arc::new(MockBackend::new(&config, persisted.clone())?);
    let mut stores = Stores::new(backend, persisted)?;

    let outcome = run(cli.command, &config, &mut stores).await;
    if outcome.is_err() {
        if let Some((store, message)) = stores.last_error() {
            tracing::debug!(store, error = message, "command failed");
        }
    }
    outcome
}

async fn run(command: Commands, config: &Config, stores: &mut Stores) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Database initialized at {}", config.db_path.display());
            println!("\nDemo accounts:");
            println!("{:<10} {:<28} {:<12}", "ROLE", "EMAIL", "PASSWORD");
            println!("{}", "-".repeat(50));
            for (email, password, role) in seed::DEMO_ACCOUNTS {
                println!("{:<10} {:<28} {:<12}", role, email, password);
            }
        }

        Commands::Login { email, password } => {
            let identity = stores.session.sign_in(&email, &password).await?;
            println!("Signed in as {} ({})", identity.name, identity.role);
        }

        Commands::Register {
            name,
            email,
            password,
            confirm,
            role,
        } => {
            let role: Role = role.parse()?;
            let form = SignUpForm {
                name,
                email,
                confirm_password: confirm.unwrap_or_else(|| password.clone()),
                password,
                role: Some(role),
            };
            let identity = stores.session.sign_up(&form).await?;
            println!("Welcome, {}! Account #{} created ({}).", identity.name, identity.id, identity.role);
            match identity.role {
                Role::Student => println!("Next: stagehub profile complete-student --help"),
                Role::Company => println!("Next: stagehub profile complete-company --help"),
                Role::Admin => {}
            }
        }

        Commands::Logout => {
            if stores.session.restore_session().is_err() {
                println!("Not signed in.");
            } else {
                stores.session.sign_out().await?;
                println!("Signed out.");
            }
        }

        Commands::Whoami => match stores.session.restore_session() {
            Ok(identity) => {
                println!("User #{}", identity.id);
                println!("Name: {}", identity.name);
                println!("Email: {}", identity.email);
                println!("Role: {}", identity.role);
            }
            Err(_) => println!("Not signed in."),
        },

        Commands::List {
            search,
            location,
            domain,
            limit,
        } => {
            let filter = PostingFilter {
                search,
                location,
                domain,
                limit,
            };
            let postings = stores.catalog.list_postings(&filter).await?;
            print_postings(postings, stores.profile.favorites());
        }

        Commands::Show { id } => {
            let posting = stores.catalog.get_posting(id).await?;
            print_posting(posting, stores.profile.is_favorite(id));
        }

        Commands::Apply { id, letter } => {
            let token = session_token(stores, Some(Role::Student))?;
            let form = ApplicationForm { cover_letter: letter };
            let application = stores.catalog.apply_to_posting(&token, id, &form).await?;
            println!(
                "Applied to '{}' (application #{}, {}).",
                application.posting_title, application.id, application.status
            );
        }

        Commands::Browse {
            search,
            location,
            domain,
        } => {
            stores.catalog.set_filters(PostingFilter {
                search,
                location,
                domain,
                limit: None,
            });
            stores.catalog.refresh().await?;
            let postings = stores.catalog.postings().to_vec();
            tui::run_browse(postings, &mut stores.profile)?;
        }

        Commands::Favorite { command } => match command {
            FavoriteCommands::Add { id } => {
                let title = stores.catalog.get_posting(id).await?.title.clone();
                stores.profile.add_favorite(id)?;
                println!("Saved #{} '{}' to favorites.", id, title);
            }

            FavoriteCommands::Remove { id } => {
                stores.profile.remove_favorite(id)?;
                println!("Removed #{} from favorites.", id);
            }

            FavoriteCommands::List => {
                let favorites = stores.profile.favorites().to_vec();
                if favorites.is_empty() {
                    println!("No favorites yet.");
                } else {
                    let listed = stores.catalog.list_postings(&PostingFilter::default()).await?;
                    let saved: Vec<Posting> = listed
                        .iter()
                        .filter(|p| favorites.contains(&p.id))
                        .cloned()
                        .collect();
                    print_postings(&saved, &favorites);
                    let gone = favorites.len() - saved.len();
                    if gone > 0 {
                        println!("\n({} saved posting(s) are no longer listed)", gone);
                    }
                }
            }

            FavoriteCommands::Clear => {
                stores.profile.clear_favorites()?;
                println!("Favorites cleared.");
            }
        },

        Commands::Profile { command } => match command {
            ProfileCommands::Show => {
                let token = session_token(stores, None)?;
                let profile = stores.profile.get_profile(&token).await?.clone();
                let identity = &profile.identity;
                let p = &profile.profile;
                println!("{} <{}>", identity.name, identity.email);
                println!("Role: {}", identity.role);
                println!(
                    "Profile: {}",
                    if p.profile_completed { "complete" } else { "incomplete" }
                );
                let optional = [
                    ("Education", &p.education),
                    ("Field", &p.field),
                    ("Location", &p.location),
                    ("Phone", &p.phone),
                    ("Website", &p.website),
                ];
                for (label, value) in optional {
                    if let Some(value) = value {
                        println!("{}: {}", label, value);
                    }
                }
                if !p.skills.is_empty() {
                    println!("Skills: {}", p.skills.join(", "));
                }
                if !p.sectors.is_empty() {
                    println!("Sectors: {}", p.sectors.join(", "));
                }
                if let Some(bio) = &p.bio {
                    println!("\n{}", textwrap::fill(bio, 78));
                }
                if let Some(doc) = stores.profile.document(identity.id)? {
                    println!(
                        "\nDocument: {} ({} bytes, uploaded {})",
                        doc.file_name,
                        doc.data.len(),
                        doc.uploaded_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }

            ProfileCommands::Edit {
                name,
                bio,
                education,
                field,
                skills,
                location,
                phone,
                website,
            } => {
                session_token(stores, None)?;
                let update = ProfileUpdate {
                    name,
                    bio,
                    education,
                    field,
                    skills: skills.map(|s| validate::clean_list(&s)),
                    location,
                    phone,
                    website,
                    ..ProfileUpdate::default()
                };
                if update.is_empty() {
                    println!("Nothing to update.");
                } else {
                    let updated = stores.update_profile(update).await?;
                    println!("Profile of {} updated.", updated.identity.name);
                }
            }

            ProfileCommands::CompleteStudent {
                bio,
                education,
                field,
                skills,
                location,
            } => {
                let token = session_token(stores, Some(Role::Student))?;
                let form = StudentOnboarding {
                    bio,
                    education,
                    field,
                    skills,
                    location,
                };
                stores.profile.complete_student_profile(&token, form).await?;
                println!("Profile complete. Find internships with: stagehub list");
            }

            ProfileCommands::CompleteCompany {
                website,
                sectors,
                description,
            } => {
                let token = session_token(stores, Some(Role::Company))?;
                let form = CompanyOnboarding {
                    website,
                    sectors,
                    description,
                };
                stores.profile.complete_company_profile(&token, form).await?;
                println!("Profile complete. Publish an offer with: stagehub company post --help");
            }

            ProfileCommands::Upload { file } => {
                session_token(stores, None)?;
                let user_id = stores
                    .session
                    .identity()
                    .map(|i| i.id)
                    .ok_or_else(|| anyhow!("No signed-in user"))?;
                let data = std::fs::read(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let doc = stores.profile.upload_document(user_id, &file_name, data)?;
                println!("Stored '{}' ({} bytes).", doc.file_name, doc.data.len());
            }

            ProfileCommands::Document { output } => {
                session_token(stores, None)?;
                let user_id = stores
                    .session
                    .identity()
                    .map(|i| i.id)
                    .ok_or_else(|| anyhow!("No signed-in user"))?;
                match stores.profile.document(user_id)? {
                    Some(doc) => match output {
                        Some(path) => {
                            std::fs::write(&path, &doc.data)
                                .with_context(|| format!("Failed to write to {}", path.display()))?;
                            println!("Document saved to: {}", path.display());
                        }
                        None => println!(
                            "{} ({} bytes, uploaded {})",
                            doc.file_name,
                            doc.data.len(),
                            doc.uploaded_at.format("%Y-%m-%d %H:%M")
                        ),
                    },
                    None => println!("No document stored."),
                }
            }
        },

        Commands::Applications => {
            let token = session_token(stores, Some(Role::Student))?;
            let applications = stores.profile.list_applications(&token).await?;
            print_applications(applications, false);
        }

        Commands::Withdraw { id } => {
            let token = session_token(stores, Some(Role::Student))?;
            let application = stores.profile.withdraw_application(&token, id).await?;
            println!("Application #{} to '{}' withdrawn.", application.id, application.posting_title);
        }

        Commands::Messages { command } => {
            let token = session_token(stores, Some(Role::Student))?;
            let inbox = &mut stores.conversations;
            match command {
                MessageCommands::List => {
                    let conversations = inbox.list_conversations(&token).await?;
                    print_conversations(conversations, |c| c.company_name.as_str());
                    println!("\nUnread: {}", inbox.unread_total());
                }

                MessageCommands::Send { id, text } => {
                    inbox.send_message(&token, id, &text).await?;
                    println!("Message sent.");
                }

                MessageCommands::Start {
                    company,
                    posting,
                    text,
                } => {
                    let conversation = inbox
                        .start_conversation(&token, &company, &posting, &text)
                        .await?;
                    println!(
                        "Conversation #{} with {} started.",
                        conversation.id, conversation.company_name
                    );
                }

                MessageCommands::Read { id } => {
                    inbox.list_conversations(&token).await?;
                    inbox.mark_as_read(id);
                    let conversation = inbox
                        .conversation(id)
                        .ok_or_else(|| anyhow!("Conversation #{} not found", id))?;
                    print_thread(conversation);
                }
            }
        }

        Commands::Company { command } => {
            let token = session_token(stores, Some(Role::Company))?;
            let org = &mut stores.organization;
            match command {
                CompanyCommands::Postings => {
                    org.list_applications(&token).await?;
                    let postings = org.list_own_postings(&token).await?;
                    print_postings(postings, &[]);
                    let stats = org.stats();
                    println!(
                        "\n{} posting(s), {} active. {} application(s), {} pending.",
                        stats.total_postings,
                        stats.active_postings,
                        stats.total_applications,
                        stats.pending_applications
                    );
                }

                CompanyCommands::Post {
                    title,
                    location,
                    duration,
                    description,
                    tags,
                    salary,
                    start_date,
                    missions,
                    requirements,
                    benefits,
                    positions,
                    draft,
                } => {
                    let fields = NewPosting {
                        title,
                        location,
                        duration,
                        description,
                        tags: validate::clean_list(&tags),
                        salary,
                        start_date,
                        missions: validate::clean_list(&missions),
                        requirements: validate::clean_list(&requirements),
                        benefits: validate::clean_list(&benefits),
                        positions,
                    };
                    let mode = if draft { PublishMode::Draft } else { PublishMode::Publish };
                    let posting = org.create_posting(&token, &fields, mode).await?;
                    println!("Created posting #{} '{}' ({}).", posting.id, posting.title, posting.status);
                }

                CompanyCommands::Close { id } => {
                    let posting = org.close_posting(&token, id).await?;
                    println!("Closed posting #{} '{}'.", posting.id, posting.title);
                }

                CompanyCommands::Applications => {
                    let applications = org.list_applications(&token).await?;
                    print_applications(applications, true);
                }

                CompanyCommands::Accept { id } => {
                    let application = org
                        .set_application_status(&token, id, ApplicationDecision::Accepted, None)
                        .await?;
                    println!("Accepted {} for '{}'.", application.applicant.name, application.posting_title);
                }

                CompanyCommands::Reject { id, reason } => {
                    let application = org
                        .set_application_status(&token, id, ApplicationDecision::Rejected, reason)
                        .await?;
                    println!("Rejected {} for '{}'.", application.applicant.name, application.posting_title);
                }

                CompanyCommands::Messages => {
                    let conversations = org.list_conversations(&token).await?;
                    print_conversations(conversations, |c| c.student_name.as_str());
                }

                CompanyCommands::Reply { id, text } => {
                    org.send_message(&token, id, &text).await?;
                    println!("Reply sent.");
                }
            }
        }

        Commands::Admin { command } => {
            let token = session_token(stores, Some(Role::Admin))?;
            let admin = &mut stores.moderation;
            match command {
                AdminCommands::Stats => {
                    admin.get_stats(&token).await?;
                    let s = admin.stats();
                    println!("Users:        {} ({} students, {} companies, {} admins)", s.total_users, s.student_count, s.company_count, s.admin_count);
                    println!("New (30d):    {}", s.new_users_this_month);
                    println!("Postings:     {} ({} active, {} pending)", s.total_postings, s.active_postings, s.pending_postings);
                    println!("Companies:    {} ({} verified)", s.total_companies, s.active_companies);
                    println!("Applications: {} ({} today)", s.total_applications, s.applications_today);

                    let activity = admin.recent_activity();
                    if !activity.is_empty() {
                        println!("\nRecent activity:");
                        for entry in activity.iter().take(10) {
                            println!(
                                "  {} {:<12} {}",
                                entry.timestamp.format("%Y-%m-%d %H:%M"),
                                entry.kind,
                                entry.message
                            );
                        }
                    }
                }

                AdminCommands::Users => {
                    let users = admin.list_users(&token).await?;
                    if users.is_empty() {
                        println!("No users found.");
                    } else {
                        println!("{:<6} {:<10} {:<10} {:<24} {:<30}", "ID", "ROLE", "STATUS", "NAME", "EMAIL");
                        println!("{}", "-".repeat(84));
                        for user in users {
                            println!(
                                "{:<6} {:<10} {:<10} {:<24} {:<30}",
                                user.id,
                                user.role,
                                user.status,
                                truncate(&user.name, 22),
                                truncate(&user.email, 28)
                            );
                        }
                    }
                }

                AdminCommands::Suspend { id } => {
                    admin.set_user_status(&token, id, UserStatus::Suspended).await?;
                    println!("User #{} suspended.", id);
                }

                AdminCommands::Activate { id } => {
                    admin.set_user_status(&token, id, UserStatus::Active).await?;
                    println!("User #{} reactivated.", id);
                }

                AdminCommands::DeleteUser { id } => {
                    admin.delete_user(&token, id).await?;
                    println!("User #{} deleted.", id);
                }

                AdminCommands::Postings => {
                    let postings = admin.list_postings(&token).await?;
                    print_postings(postings, &[]);
                }

                AdminCommands::Approve { id } => {
                    let posting = admin
                        .set_posting_status(&token, id, ModerationDecision::Approved)
                        .await?;
                    println!("Posting #{} '{}' is now {}.", posting.id, posting.title, posting.status);
                }

                AdminCommands::Reject { id } => {
                    let posting = admin
                        .set_posting_status(&token, id, ModerationDecision::Rejected)
                        .await?;
                    println!("Posting #{} '{}' is now {}.", posting.id, posting.title, posting.status);
                }

                AdminCommands::DeletePosting { id } => {
                    admin.delete_posting(&token, id).await?;
                    println!("Posting #{} deleted.", id);
                }

                AdminCommands::Companies => {
                    let companies = admin.list_companies(&token).await?;
                    if companies.is_empty() {
                        println!("No companies found.");
                    } else {
                        println!("{:<6} {:<10} {:<24} {:<20} {:>8} {:>8}", "ID", "STATUS", "NAME", "LOCATION", "POSTINGS", "APPS");
                        println!("{}", "-".repeat(81));
                        for company in companies {
                            println!(
                                "{:<6} {:<10} {:<24} {:<20} {:>8} {:>8}",
                                company.id,
                                company.status,
                                truncate(&company.name, 22),
                                truncate(&company.location, 18),
                                company.postings_count,
                                company.applications_count
                            );
                        }
                    }
                }

                AdminCommands::Verify { id } => {
                    let company = admin.verify_company(&token, id).await?;
                    println!("{} is now {}.", company.name, company.status);
                }

                AdminCommands::SuspendCompany { id } => {
                    let company = admin.suspend_company(&token, id).await?;
                    println!("{} is now {}. Its postings are hidden from the catalog.", company.name, company.status);
                }

                AdminCommands::AddAdmin {
                    name,
                    email,
                    password,
                    confirm,
                } => {
                    let form = models::AdminForm {
                        name,
                        email,
                        confirm_password: confirm.unwrap_or_else(|| password.clone()),
                        password,
                    };
                    let account = admin.add_admin(&token, &form).await?;
                    println!("Administrator #{} {} <{}> added.", account.id, account.name, account.email);
                }

                AdminCommands::Admins => {
                    let admins = admin.list_admins(&token).await?;
                    if admins.is_empty() {
                        println!("No additional administrators.");
                    } else {
                        println!("{:<6} {:<10} {:<24} {:<30} {:<12}", "ID", "STATUS", "NAME", "EMAIL", "CREATED");
                        println!("{}", "-".repeat(85));
                        for account in admins {
                            println!(
                                "{:<6} {:<10} {:<24} {:<30} {:<12}",
                                account.id,
                                account.status,
                                truncate(&account.name, 22),
                                truncate(&account.email, 28),
                                account.created_at.format("%Y-%m-%d")
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_postings(postings: &[Posting], favorites: &[PostingId]) {
    if postings.is_empty() {
        println!("No postings found.");
        return;
    }
    println!("{:<6} {:<9} {:<32} {:<18} {:<16} {:>5}", "ID", "STATUS", "TITLE", "COMPANY", "LOCATION", "APPS");
    println!("{}", "-".repeat(91));
    for posting in postings {
        let marker = if favorites.contains(&posting.id) { "*" } else { "" };
        println!(
            "{:<6} {:<9} {:<32} {:<18} {:<16} {:>5}",
            format!("{}{}", posting.id, marker),
            posting.status,
            truncate(&posting.title, 30),
            truncate(&posting.company, 16),
            truncate(&posting.location, 14),
            posting.applications_count
        );
    }
}

fn print_posting(posting: &Posting, favorite: bool) {
    println!("Posting #{}{}", posting.id, if favorite { " (favorite)" } else { "" });
    println!("Title: {}", posting.title);
    println!("Company: {}", posting.company);
    println!("Location: {}", posting.location);
    println!("Duration: {}", posting.duration);
    if let Some(salary) = &posting.salary {
        println!("Salary: {}", salary);
    }
    if let Some(start) = &posting.start_date {
        println!("Start: {}", start);
    }
    println!("Positions: {}", posting.positions);
    println!("Status: {}", posting.status);
    println!("Applications: {}", posting.applications_count);
    println!("Published: {}", posting.created_at.format("%Y-%m-%d"));
    if !posting.tags.is_empty() {
        println!("Tags: {}", posting.tags.join(", "));
    }
    println!("\n{}", textwrap::fill(&posting.description, 78));
    for (label, items) in [
        ("Missions", &posting.missions),
        ("Requirements", &posting.requirements),
        ("Benefits", &posting.benefits),
    ] {
        if !items.is_empty() {
            println!("\n{}:", label);
            for item in items {
                println!("  - {}", item);
            }
        }
    }
}

fn print_applications(applications: &[Application], show_applicant: bool) {
    if applications.is_empty() {
        println!("No applications found.");
        return;
    }
    let who = if show_applicant { "APPLICANT" } else { "" };
    println!("{:<6} {:<10} {:<32} {:<22} {:<12}", "ID", "STATUS", "POSTING", who, "APPLIED");
    println!("{}", "-".repeat(86));
    for application in applications {
        let applicant = if show_applicant {
            truncate(&application.applicant.name, 20)
        } else {
            String::new()
        };
        println!(
            "{:<6} {:<10} {:<32} {:<22} {:<12}",
            application.id,
            application.status,
            truncate(&application.posting_title, 30),
            applicant,
            application.applied_at.format("%Y-%m-%d")
        );
        if let Some(reason) = &application.reason {
            println!("       reason: {}", reason);
        }
    }
}

fn print_conversations<F>(conversations: &[Conversation], counterpart: F)
where
    F: Fn(&Conversation) -> &str,
{
    if conversations.is_empty() {
        println!("No conversations.");
        return;
    }
    println!("{:<6} {:<20} {:<26} {:<30} {:>6}", "ID", "WITH", "ABOUT", "LAST MESSAGE", "UNREAD");
    println!("{}", "-".repeat(92));
    for conversation in conversations {
        println!(
            "{:<6} {:<20} {:<26} {:<30} {:>6}",
            conversation.id,
            truncate(counterpart(conversation), 18),
            truncate(&conversation.posting_title, 24),
            truncate(&conversation.last_message, 28),
            conversation.unread_count
        );
    }
}

fn print_thread(conversation: &Conversation) {
    println!(
        "{} / {} - {}",
        conversation.student_name, conversation.company_name, conversation.posting_title
    );
    println!("{}", "-".repeat(60));
    for message in &conversation.messages {
        let author = match message.sender {
            Sender::Student => &conversation.student_name,
            Sender::Company => &conversation.company_name,
        };
        println!("[{}] {}:", message.timestamp.format("%Y-%m-%d %H:%M"), author);
        for line in textwrap::fill(&message.text, 74).lines() {
            println!("  {}", line);
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
