use cancellation_backend::config::DEFAULT_MOCK_USER_ID;
use cancellation_backend::utils::jwt::{JwtConfig, JwtManager};
use std::env;
use uuid::Uuid;

fn main() {
    let args: Vec<String> = env::args().collect();

    // 引数が無ければ開発用ユーザーで発行
    let user_id_arg = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| DEFAULT_MOCK_USER_ID.to_string());
    let email = args.get(2).cloned();

    let user_id = match Uuid::parse_str(&user_id_arg) {
        Ok(user_id) => user_id,
        Err(_) => {
            eprintln!("Error: '{}' is not a valid user id", user_id_arg);
            eprintln!("Usage: issue-dev-token [user-id] [email]");
            std::process::exit(1);
        }
    };

    // サーバーと同じ JWT_* 設定で署名する
    dotenvy::dotenv().ok();
    let jwt_config = match JwtConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading JWT configuration: {}", e);
            std::process::exit(1);
        }
    };

    let jwt_manager = match JwtManager::new(jwt_config) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error creating JWT manager: {}", e);
            std::process::exit(1);
        }
    };

    match jwt_manager.generate_access_token(user_id, email) {
        Ok(token) => {
            println!("\n=== Access Token Issued ===");
            println!("User ID: {}", user_id);
            println!(
                "Expires in: {} minutes",
                jwt_manager.access_token_expiry_minutes()
            );
            println!("\nUse with AUTH_MODE=jwt:");
            println!("Authorization: Bearer {}", token);
        }
        Err(e) => {
            eprintln!("Error generating token: {}", e);
            std::process::exit(1);
        }
    }
}
