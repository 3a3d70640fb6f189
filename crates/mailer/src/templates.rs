//! HTML bodies for the three mails this service sends. Each carries a
//! tokened link the web client exchanges for a one-time password view.

const BUTTON_STYLE: &str = "margin-top: 32px; margin-bottom: 32px; padding: 13px 28px; \
     background-color: #990f3d; color: #fff; border-radius: 4px; text-decoration: none;";

/// Link the mails point at; `token` is an unpadded base64url JWT and needs no
/// further escaping.
pub fn password_view_url(web_client_base_url: &str, token: &str) -> String {
    format!("{}/#/password?qs={}", web_client_base_url, token)
}

pub fn new_user_html(username: &str, url: &str) -> String {
    format!(
        "<p>Dear {username},</p> \
         <p>Welcome aboard, we hope you have a swell time here.</p> \
         <p>When you signed up to use our service you selected a password, to view it click the button below</p><br /> \
         <a href=\"{url}\" style=\"{style}\">View your Password</a> \
         <br /> \
         <p>Alternatively, you can paste the following link in your browser address bar:</p> \
         <p>{url}</p> \
         <p>If you have not requested a password reset simply ignore this message.</p> \
         <p>Sincerely,</p> \
         <p>The Recall Team</p>",
        username = username,
        url = url,
        style = BUTTON_STYLE,
    )
}

pub fn password_reset_html(username: &str, url: &str) -> String {
    format!(
        "<p>Dear {username},</p> \
         <p>A new password has been generated for you. Click the button below to view it.</p> <br /> \
         <a href=\"{url}\" style=\"{style}\">View your Password</a> \
         <br /> \
         <p>Alternatively, you can paste the following link in your browser address bar:</p> \
         <p>{url}</p> \
         <p>If you have not requested a password reset simply ignore this message.</p> \
         <p>Sincerely,</p> \
         <p>The Recall Team</p>",
        username = username,
        url = url,
        style = BUTTON_STYLE,
    )
}

pub fn password_reminder_html(username: &str, url: &str) -> String {
    format!(
        "<p>Dear {username},</p> \
         <p>This is your scheduled password reminder. Click the button below to view your password.</p> <br /> \
         <a href=\"{url}\" style=\"{style}\">View your Password</a> \
         <br /> \
         <p>Alternatively, you can paste the following link in your browser address bar:</p> \
         <p>{url}</p> \
         <p>You chose this reminder interval when you registered.</p> \
         <p>Sincerely,</p> \
         <p>The Recall Team</p>",
        username = username,
        url = url,
        style = BUTTON_STYLE,
    )
}
