use crate::handlers::auth::TokenIssuer;
use crate::handlers::directory::UserDirectory;
use crate::handlers::errors::ApiError;
use crate::handlers::policy::{require_policy, ADMIN_USERS, ALL_USERS};
use crate::middleware::auth_middleware::AuthMiddleware;
use crate::models::all_models::{NewUser, User};
use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};

//Authenticate
//Authenticate Input: username path segment
//Authenticate Output: token as a JSON string, or an empty 401
pub async fn authenticate(
    issuer: web::Data<TokenIssuer>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();

    match issuer.issue(&username) {
        Ok(Some(token)) => Ok(HttpResponse::Ok().json(token)),
        Ok(None) => Err(ApiError::Unauthorized),
        Err(e) => {
            error!("Failed to sign token for '{}': {}", username, e);
            Err(ApiError::Internal("token signing failed".into()))
        }
    }
}

//List Users
//List Users Input: HttpRequest(JWT Token)
//List Users Output: Vec<User>
pub async fn list_users(
    req: HttpRequest,
    directory: web::Data<UserDirectory>,
) -> Result<HttpResponse, ApiError> {
    require_policy(&req, &ALL_USERS)?;
    Ok(HttpResponse::Ok().json(directory.list_all()))
}

//Add User
//Add User Input: HttpRequest(JWT Token), NewUser
//Add User Output: empty 200
pub async fn add_user(
    req: HttpRequest,
    directory: web::Data<UserDirectory>,
    payload: web::Json<NewUser>,
) -> Result<HttpResponse, ApiError> {
    let admin = require_policy(&req, &ADMIN_USERS)?;
    let user = User::from(payload.into_inner());
    info!(
        "'{}' added user '{}' ({}) with roles {:?}",
        admin.username, user.username, user.id, user.roles
    );
    directory.add(user);
    Ok(HttpResponse::Ok().finish())
}

//Config User Routes
// GET /users/authenticate/{username}  (anonymous)
// GET /users                           (AllUsers)
// POST /users                          (AdminUsers)
pub fn config_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/authenticate/{username}", web::get().to(authenticate))
            .service(
                web::resource("")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(list_users))
                    .route(web::post().to(add_user)),
            ),
    );
}
