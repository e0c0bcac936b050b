pub mod cache;
pub mod error;
pub mod memory;
pub mod postgrest;
pub mod repository;
pub mod supabase;

pub use cache::{MemoryOtpCache, OtpCache, RedisOtpCache};
pub use error::{StoreError, StoreResult, UniqueKey};
pub use memory::MemoryDatabase;
pub use postgrest::SupabaseDatabase;
pub use repository::{
    ChatRepository, ConversationScope, ProfileRepository, RefreshTokenRepository, Repositories,
    Reservation, ScheduleRepository, UserRepository,
};
