use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use recall_database::{db_connect::map_unique_violation, service::DbService};
use recall_error::{AppError, AppResult, auth_error};
use recall_mailer::{MailTransport, templates};
use recall_middleware::{JwtService, TokenPurpose, security::password, validation};
use recall_models::{
    question::{Answer, Question, QuestionView},
    sentence::Sentence,
    user::{
        AuthResponse, ChangeEmailInput, ForgotPasswordInput, LoginInput, LoginStartInput,
        RegisterInput, ResetPasswordInput, User, UserProfile,
    },
};
use recall_utils::{generate_password, generate_passwords};

use crate::reminder::{self, ReminderContext};

/// How many candidate passwords the registration preview offers
const PREVIEW_PASSWORDS: usize = 3;

/// Response of the sentence-validation step: candidate passwords plus the
/// question catalogue the client registers answers against
#[derive(Debug, Serialize)]
pub struct SentencePreview {
    pub passwords: Vec<String>,
    pub questions: Vec<QuestionView>,
}

/// Response of the identity+password step: the question challenge
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginChallenge {
    pub user_id: String,
    pub question: QuestionView,
}

/// Trait defining the account service interface
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    /// Validate sentences and produce the registration preview
    async fn preview_passwords(&self, sentences: Vec<String>) -> AppResult<SentencePreview>;

    /// Pre-registration check: field rules plus username/email availability
    async fn validate_new_user(&self, input: RegisterInput) -> AppResult<()>;

    /// Register a new user with sentences and security-question answers
    async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse>;

    /// First login step: identity + password, answered with a question
    async fn validate_login(&self, input: LoginStartInput) -> AppResult<LoginChallenge>;

    /// Second login step: the security-question answer
    async fn login(&self, input: LoginInput) -> AppResult<AuthResponse>;

    /// Probe an email for the forgot-password flow
    async fn question_for_email(&self, email: &str) -> AppResult<QuestionView>;

    /// Any question, picked uniformly at random
    async fn random_question(&self) -> AppResult<QuestionView>;

    /// Verify the answer and send the reset email
    async fn forgot_password(&self, input: ForgotPasswordInput) -> AppResult<()>;

    /// Derive a fresh password from the user's sentences and persist it
    async fn reset_password(&self, input: ResetPasswordInput) -> AppResult<String>;

    /// Probe a new email for the change-email flow
    async fn check_email_available(&self, email: &str) -> AppResult<QuestionView>;

    /// Change the authenticated user's email after an answer check
    async fn change_email(&self, user: User, input: ChangeEmailInput) -> AppResult<UserProfile>;

    /// Get the JWT service
    fn get_jwt_service(&self) -> Arc<JwtService>;
}

/// Implementation of the account service
pub struct AccountService {
    jwt_service: Arc<JwtService>,
    users: Arc<DbService<'static, User>>,
    questions: Arc<DbService<'static, Question>>,
    answers: Arc<DbService<'static, Answer>>,
    sentences: Arc<DbService<'static, Sentence>>,
    mailer: Arc<dyn MailTransport>,
    web_client_base_url: String,
}

impl AccountService {
    pub fn new(
        jwt_service: Arc<JwtService>,
        users: Arc<DbService<'static, User>>,
        questions: Arc<DbService<'static, Question>>,
        answers: Arc<DbService<'static, Answer>>,
        sentences: Arc<DbService<'static, Sentence>>,
        mailer: Arc<dyn MailTransport>,
        web_client_base_url: String,
    ) -> Self {
        Self {
            jwt_service,
            users,
            questions,
            answers,
            sentences,
            mailer,
            web_client_base_url,
        }
    }

    pub fn reminder_context(&self) -> ReminderContext {
        ReminderContext {
            jwt_service: Arc::clone(&self.jwt_service),
            mailer: Arc::clone(&self.mailer),
            web_client_base_url: self.web_client_base_url.clone(),
        }
    }

    // Helper to format user IDs arriving from token claims
    fn clean_user_id(user_id: &str) -> String {
        user_id
            .trim_start_matches('⟨')
            .trim_end_matches('⟩')
            .to_string()
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self
            .users
            .get_records_by_field("username", username.to_string())
            .await?;
        Ok(users.into_iter().next())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self
            .users
            .get_records_by_field("email", email.to_string())
            .await?;
        Ok(users.into_iter().next())
    }

    // Identity is a username or an email; either matches
    async fn find_by_identity(&self, identity: &str) -> AppResult<Option<User>> {
        let users = self
            .users
            .run_custom_query(
                "SELECT * FROM users WHERE username = $identity OR email = $identity",
                vec![("identity".to_string(), serde_json::json!(identity))],
            )
            .await?;
        Ok(users.into_iter().next())
    }

    async fn find_question(&self, question_id: &str) -> AppResult<Question> {
        self.questions
            .get_record_by_id(question_id)
            .await?
            .ok_or_else(|| {
                AppError::AuthenticationError("That question does not exist.".to_string())
            })
    }

    /// The stored answer for one (user, question) pair. Nothing enforces a
    /// single row, so the oldest wins; zero rows is a data gap, not a wrong
    /// answer, and surfaces as a generic failure upstream.
    async fn stored_answer(&self, user_id: &str, question_id: &str) -> AppResult<Option<String>> {
        let rows = self
            .answers
            .run_custom_query(
                "SELECT * FROM answers WHERE user_id = $user_id AND question_id = $question_id \
                 ORDER BY created_at ASC LIMIT 1",
                vec![
                    ("user_id".to_string(), serde_json::json!(user_id)),
                    ("question_id".to_string(), serde_json::json!(question_id)),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|answer| answer.text))
    }

    /// Case-sensitive exact comparison against the stored answer
    async fn verify_answer(&self, user: &User, question_id: &str, answer: &str) -> AppResult<()> {
        let stored = self
            .stored_answer(&user.record_id(), question_id)
            .await?
            .ok_or_else(|| {
                AppError::ServerError(anyhow::anyhow!(
                    "no stored answer for user {} and question {}",
                    user.record_id(),
                    question_id
                ))
            })?;

        if stored != answer {
            return Err(AppError::invalid_credentials());
        }

        Ok(())
    }

    fn create_auth_response(&self, user: &User) -> AppResult<AuthResponse> {
        let token = self
            .jwt_service
            .generate_token(&user.record_id(), TokenPurpose::Session)?;

        Ok(AuthResponse { token })
    }

    async fn send_welcome_email(&self, user: &User) -> AppResult<()> {
        let token = self
            .jwt_service
            .generate_token(&user.record_id(), TokenPurpose::Session)?;
        let url = templates::password_view_url(&self.web_client_base_url, &token);
        let html = templates::new_user_html(&user.username, &url);

        self.mailer.send(&user.email, "Password", &html).await?;
        Ok(())
    }

    async fn send_reset_email(&self, user: &User) -> AppResult<()> {
        let token = self
            .jwt_service
            .generate_token(&user.record_id(), TokenPurpose::PasswordReset)?;
        let url = templates::password_view_url(&self.web_client_base_url, &token);
        let html = templates::password_reset_html(&user.username, &url);

        self.mailer.send(&user.email, "Password", &html).await?;
        Ok(())
    }

    /// Store the registration's sentences and answers. Runs after the user
    /// row exists; the caller rolls the user back if this fails.
    async fn store_entropy(&self, user: &User, input: &RegisterInput) -> AppResult<()> {
        let user_id = user.record_id();

        for sentence in &input.sentences {
            self.sentences
                .create_record(Sentence::new(sentence.text.clone(), user_id.clone()))
                .await?;
        }

        for answer in &input.answers {
            self.answers
                .create_record(Answer::new(
                    answer.text.clone(),
                    user_id.clone(),
                    answer.question_id.clone(),
                ))
                .await?;
        }

        Ok(())
    }

    /// Duplicate checks, username first: a taken username must short-circuit
    /// before the email lookup ever runs
    async fn ensure_identity_available(&self, username: &str, email: &str) -> AppResult<()> {
        if self.find_by_username(username).await?.is_some() {
            return Err(AppError::duplicate(
                "username",
                "A user with that username already exists",
            ));
        }

        if self.find_by_email(email).await?.is_some() {
            return Err(AppError::duplicate(
                "email",
                "A user with that email already exists",
            ));
        }

        Ok(())
    }

    async fn user_sentences(&self, user: &User) -> AppResult<Vec<String>> {
        let sentences = self
            .sentences
            .get_records_by_field("user_id", user.record_id())
            .await?;
        Ok(sentences.into_iter().map(|s| s.text).collect())
    }
}

#[async_trait]
impl AccountServiceTrait for AccountService {
    fn get_jwt_service(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt_service)
    }

    async fn preview_passwords(&self, sentences: Vec<String>) -> AppResult<SentencePreview> {
        validation::validate_sentence_set(&sentences)?;

        let questions = self.questions.get_all_records().await?;

        Ok(SentencePreview {
            passwords: generate_passwords(&sentences, PREVIEW_PASSWORDS),
            questions: questions.into_iter().map(QuestionView::from).collect(),
        })
    }

    async fn validate_new_user(&self, input: RegisterInput) -> AppResult<()> {
        validation::validate_registration(&input, true)?;

        let username = validation::sanitize_string(&input.username);
        let email = validation::sanitize_string(&input.email);

        self.ensure_identity_available(&username, &email).await
    }

    async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse> {
        validation::validate_registration(&input, false)?;

        let username = validation::sanitize_string(&input.username);
        let email = validation::sanitize_string(&input.email);

        self.ensure_identity_available(&username, &email).await?;

        let password_hash = match &input.password {
            Some(plain) => Some(password::hash_password(plain)?),
            None => None,
        };

        let user = User::new(
            username,
            email,
            password_hash,
            input.sex.clone(),
            input.age,
            input.location.clone(),
            input.password_reminder,
        );

        info!("Storing new user in database: {}", user.username);

        let stored_user = match self.users.create_record(user.clone()).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                error!("Database did not return stored user");
                user.clone()
            }
            // The unique index catches the concurrent-registration race the
            // lookups above cannot
            Err(e) => return Err(map_unique_violation(e)),
        };

        if let Err(e) = self.store_entropy(&stored_user, &input).await {
            warn!(
                "Rolling back user {} after failed sentence/answer writes",
                stored_user.username
            );
            if let Err(rollback) = self.users.delete_record(&stored_user.record_id()).await {
                error!("Failed to roll back user record: {}", rollback);
            }
            return Err(e);
        }

        self.send_welcome_email(&stored_user).await?;

        reminder::spawn_reminder(stored_user.clone(), self.reminder_context());

        self.create_auth_response(&stored_user)
    }

    async fn validate_login(&self, input: LoginStartInput) -> AppResult<LoginChallenge> {
        validation::validate_login_start(&input)?;

        let identity = validation::sanitize_string(&input.identity);

        let user = self
            .find_by_identity(&identity)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        let hash = user
            .password
            .as_deref()
            .ok_or_else(AppError::invalid_credentials)?;

        if !password::verify_password(&input.password, hash)? {
            return Err(AppError::invalid_credentials());
        }

        let question = self.random_question().await?;

        Ok(LoginChallenge {
            user_id: user.record_id(),
            question,
        })
    }

    async fn login(&self, input: LoginInput) -> AppResult<AuthResponse> {
        let Some(user) = self
            .users
            .get_record_by_id(&Self::clean_user_id(&input.user_id))
            .await?
        else {
            return auth_error!("User does not exist.");
        };

        let question = self.find_question(&input.question_id).await?;

        self.verify_answer(&user, &question.record_id(), &input.answer)
            .await?;

        info!("Security-question login succeeded for {}", user.username);

        self.create_auth_response(&user)
    }

    async fn question_for_email(&self, email: &str) -> AppResult<QuestionView> {
        validation::validate_email_field(email)?;

        if self.find_by_email(email).await?.is_none() {
            return Err(AppError::ValidationError("User does not exist.".to_string()));
        }

        self.random_question().await
    }

    async fn random_question(&self) -> AppResult<QuestionView> {
        let questions = self.questions.get_all_records().await?;

        let question = {
            let mut rng = rand::rng();
            questions.choose(&mut rng).cloned()
        };

        question.map(QuestionView::from).ok_or_else(|| {
            AppError::ServerError(anyhow::anyhow!("no security questions are seeded"))
        })
    }

    async fn forgot_password(&self, input: ForgotPasswordInput) -> AppResult<()> {
        validation::validate_email_field(&input.email)?;

        let Some(user) = self.find_by_email(&input.email).await? else {
            return auth_error!("User does not exist.");
        };

        let question = self.find_question(&input.question_id).await?;

        self.verify_answer(&user, &question.record_id(), &input.answer)
            .await?;

        self.send_reset_email(&user).await?;

        info!("Reset email queued for {}", user.username);

        Ok(())
    }

    async fn reset_password(&self, input: ResetPasswordInput) -> AppResult<String> {
        // Expired reset windows surface as the distinct "expired" failure
        let claims = self.jwt_service.validate_token(&input.token)?;

        let user = self
            .users
            .get_record_by_id(&Self::clean_user_id(&claims.sub))
            .await?
            .ok_or_else(AppError::token_invalid)?;

        let question = self.find_question(&input.question_id).await?;

        self.verify_answer(&user, &question.record_id(), &input.answer)
            .await?;

        let sentences = self.user_sentences(&user).await?;
        let new_password = generate_password(&sentences);

        let mut updated = user.clone();
        updated.password = Some(password::hash_password(&new_password)?);

        self.users
            .update_record(&user.record_id(), updated)
            .await?;

        info!("Password regenerated for {}", user.username);

        // The plaintext is shown exactly once; only the hash is stored
        Ok(new_password)
    }

    async fn check_email_available(&self, email: &str) -> AppResult<QuestionView> {
        validation::validate_email_field(email)?;

        if self.find_by_email(email).await?.is_some() {
            return Err(AppError::ValidationError(
                "A user with that email already exists".to_string(),
            ));
        }

        self.random_question().await
    }

    async fn change_email(&self, user: User, input: ChangeEmailInput) -> AppResult<UserProfile> {
        validation::validate_email_field(&input.email)?;

        if self.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::ValidationError(
                "A user with that email already exists".to_string(),
            ));
        }

        let question = self.find_question(&input.question_id).await?;

        self.verify_answer(&user, &question.record_id(), &input.answer)
            .await?;

        let mut updated = user.clone();
        updated.email = validation::sanitize_string(&input.email);

        let stored = self
            .users
            .update_record(&user.record_id(), updated.clone())
            .await?
            .unwrap_or(updated);

        info!("Email changed for {}", stored.username);

        Ok(UserProfile::from(stored))
    }
}
