// region:    --- Offers
/// 오퍼 생성
pub const INSERT_OFFER: &str = r#"
    INSERT INTO offers (id, seller_id, buyer_id, title, description, price, delivery_time,
                        revision_count, expiry_date, status, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
"#;

/// 오퍼 조회 (갱신용 잠금)
pub const GET_OFFER_FOR_UPDATE: &str = r#"
    SELECT id, seller_id, buyer_id, title, description, price, delivery_time, revision_count,
           expiry_date, status, created_at, updated_at
    FROM offers
    WHERE id = $1
    FOR UPDATE
"#;

/// 오퍼 상태 변경
pub const UPDATE_OFFER_STATUS: &str =
    "UPDATE offers SET status = $2, updated_at = $3 WHERE id = $1";

/// 판매자가 보낸 오퍼 조회
pub const GET_OFFERS_BY_SELLER: &str = r#"
    SELECT id, seller_id, buyer_id, title, description, price, delivery_time, revision_count,
           expiry_date, status, created_at, updated_at
    FROM offers
    WHERE seller_id = $1
    ORDER BY created_at DESC
"#;

/// 구매자가 받은 오퍼 조회
pub const GET_OFFERS_FOR_BUYER: &str = r#"
    SELECT id, seller_id, buyer_id, title, description, price, delivery_time, revision_count,
           expiry_date, status, created_at, updated_at
    FROM offers
    WHERE buyer_id = $1
    ORDER BY created_at DESC
"#;

/// 만료된 대기 오퍼 일괄 만료 처리
pub const EXPIRE_OFFERS: &str = r#"
    UPDATE offers SET status = 'expired', updated_at = $1
    WHERE status = 'pending' AND expiry_date < $1
    RETURNING id, seller_id, buyer_id, title, description, price, delivery_time, revision_count,
              expiry_date, status, created_at, updated_at
"#;
// endregion: --- Offers

// region:    --- Orders
/// 주문 생성
pub const INSERT_ORDER: &str = r#"
    INSERT INTO orders (id, gig_id, package_id, offer_id, buyer_id, seller_id, seller_user_id,
                        requirements, price, delivery_time, expected_delivery_date,
                        actual_delivery_date, revision_count, revisions_used, status, is_late,
                        created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
"#;

/// 주문 조회 (갱신용 잠금)
pub const GET_ORDER_FOR_UPDATE: &str = r#"
    SELECT id, gig_id, package_id, offer_id, buyer_id, seller_id, seller_user_id, requirements,
           price, delivery_time, expected_delivery_date, actual_delivery_date, revision_count,
           revisions_used, status, is_late, created_at, updated_at
    FROM orders
    WHERE id = $1
    FOR UPDATE
"#;

/// 오퍼로 생성된 주문 조회
pub const GET_ORDER_BY_OFFER: &str = r#"
    SELECT id, gig_id, package_id, offer_id, buyer_id, seller_id, seller_user_id, requirements,
           price, delivery_time, expected_delivery_date, actual_delivery_date, revision_count,
           revisions_used, status, is_late, created_at, updated_at
    FROM orders
    WHERE offer_id = $1
"#;

/// 주문 갱신 (변경 가능한 필드만)
pub const UPDATE_ORDER: &str = r#"
    UPDATE orders
    SET actual_delivery_date = $2, revisions_used = $3, status = $4, is_late = $5, updated_at = $6
    WHERE id = $1
"#;

/// 구매자 주문 조회 (상태 필터 선택)
pub const GET_BUYER_ORDERS: &str = r#"
    SELECT id, gig_id, package_id, offer_id, buyer_id, seller_id, seller_user_id, requirements,
           price, delivery_time, expected_delivery_date, actual_delivery_date, revision_count,
           revisions_used, status, is_late, created_at, updated_at
    FROM orders
    WHERE buyer_id = $1 AND ($2::order_status IS NULL OR status = $2)
    ORDER BY created_at DESC
"#;

/// 판매자 주문 조회 (상태 필터 선택)
pub const GET_SELLER_ORDERS: &str = r#"
    SELECT id, gig_id, package_id, offer_id, buyer_id, seller_id, seller_user_id, requirements,
           price, delivery_time, expected_delivery_date, actual_delivery_date, revision_count,
           revisions_used, status, is_late, created_at, updated_at
    FROM orders
    WHERE seller_user_id = $1 AND ($2::order_status IS NULL OR status = $2)
    ORDER BY created_at DESC
"#;

/// 긱 주문 조회 (상태 필터 선택)
pub const GET_GIG_ORDERS: &str = r#"
    SELECT id, gig_id, package_id, offer_id, buyer_id, seller_id, seller_user_id, requirements,
           price, delivery_time, expected_delivery_date, actual_delivery_date, revision_count,
           revisions_used, status, is_late, created_at, updated_at
    FROM orders
    WHERE gig_id = $1 AND ($2::order_status IS NULL OR status = $2)
    ORDER BY created_at DESC
"#;
// endregion: --- Orders

// region:    --- Deliveries / Revisions
/// 납품 기록 추가
pub const INSERT_DELIVERY: &str = r#"
    INSERT INTO order_deliveries (id, order_id, message, files, delivered_at, is_final_delivery)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// 주문 납품 이력 조회
pub const GET_ORDER_DELIVERIES: &str = r#"
    SELECT id, order_id, message, files, delivered_at, is_final_delivery
    FROM order_deliveries
    WHERE order_id = $1
    ORDER BY delivered_at ASC
"#;

/// 수정 요청 추가
pub const INSERT_REVISION: &str = r#"
    INSERT INTO order_revisions (id, order_id, requested_by, request_message, request_date,
                                 response_message, response_date, status)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

/// 주문 수정 요청 이력 조회
pub const GET_ORDER_REVISIONS: &str = r#"
    SELECT id, order_id, requested_by, request_message, request_date, response_message,
           response_date, status
    FROM order_revisions
    WHERE order_id = $1
    ORDER BY request_date ASC
"#;
// endregion: --- Deliveries / Revisions

// region:    --- Payments
/// 결제 생성
pub const INSERT_PAYMENT: &str = r#"
    INSERT INTO payments (id, order_id, amount, platform_fee, seller_amount, currency, status,
                          created_at, released_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

/// 결제 조회
pub const GET_PAYMENT: &str = r#"
    SELECT id, order_id, amount, platform_fee, seller_amount, currency, status, created_at,
           released_at
    FROM payments
    WHERE id = $1
"#;

/// 주문 결제 조회 (갱신용 잠금)
pub const GET_PAYMENT_BY_ORDER: &str = r#"
    SELECT id, order_id, amount, platform_fee, seller_amount, currency, status, created_at,
           released_at
    FROM payments
    WHERE order_id = $1
    FOR UPDATE
"#;

/// 결제 상태 변경
pub const UPDATE_PAYMENT: &str =
    "UPDATE payments SET status = $2, released_at = $3 WHERE id = $1";

/// 판매자 정산 원장 (결제 + 주문 상태)
pub const GET_SELLER_LEDGER: &str = r#"
    SELECT p.id, p.order_id, p.amount, p.platform_fee, p.seller_amount, p.currency, p.status,
           p.created_at, p.released_at, o.status AS order_status
    FROM payments p
    JOIN orders o ON o.id = p.order_id
    WHERE o.seller_user_id = $1
    ORDER BY p.created_at DESC
"#;
// endregion: --- Payments

// region:    --- Reviews
/// 리뷰 생성
pub const INSERT_REVIEW: &str = r#"
    INSERT INTO reviews (id, order_id, gig_id, reviewer_id, reviewee_id, communication_rating,
                         service_rating, recommendation_rating, overall_rating, comment,
                         seller_response, seller_response_date, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
"#;

/// 리뷰 조회 (갱신용 잠금)
pub const GET_REVIEW_FOR_UPDATE: &str = r#"
    SELECT id, order_id, gig_id, reviewer_id, reviewee_id, communication_rating, service_rating,
           recommendation_rating, overall_rating, comment, seller_response, seller_response_date,
           created_at
    FROM reviews
    WHERE id = $1
    FOR UPDATE
"#;

/// 주문 리뷰 조회
pub const GET_REVIEW_BY_ORDER: &str = r#"
    SELECT id, order_id, gig_id, reviewer_id, reviewee_id, communication_rating, service_rating,
           recommendation_rating, overall_rating, comment, seller_response, seller_response_date,
           created_at
    FROM reviews
    WHERE order_id = $1
"#;

/// 판매자 답글 기록
pub const UPDATE_REVIEW_RESPONSE: &str =
    "UPDATE reviews SET seller_response = $2, seller_response_date = $3 WHERE id = $1";

/// 판매자(리뷰 대상자) 리뷰 조회
pub const GET_REVIEWS_BY_REVIEWEE: &str = r#"
    SELECT id, order_id, gig_id, reviewer_id, reviewee_id, communication_rating, service_rating,
           recommendation_rating, overall_rating, comment, seller_response, seller_response_date,
           created_at
    FROM reviews
    WHERE reviewee_id = $1
    ORDER BY created_at DESC
"#;

/// 긱 리뷰 조회
pub const GET_REVIEWS_BY_GIG: &str = r#"
    SELECT id, order_id, gig_id, reviewer_id, reviewee_id, communication_rating, service_rating,
           recommendation_rating, overall_rating, comment, seller_response, seller_response_date,
           created_at
    FROM reviews
    WHERE gig_id = $1
    ORDER BY created_at DESC
"#;
// endregion: --- Reviews

// region:    --- Derived Fields
/// 판매자 프로필 파생 필드 조회 (갱신용 잠금)
pub const GET_SELLER_PROFILE: &str = r#"
    SELECT id AS seller_id, rating_average, account_level, total_earnings
    FROM seller_profiles
    WHERE id = $1
    FOR UPDATE
"#;

/// 판매자 프로필 부분 갱신 (NULL 인 인자는 기존 값 유지)
pub const PATCH_SELLER_PROFILE: &str = r#"
    UPDATE seller_profiles
    SET rating_average = COALESCE($2, rating_average),
        account_level = COALESCE($3, account_level),
        total_earnings = COALESCE($4, total_earnings)
    WHERE id = $1
"#;

/// 긱 파생 필드 조회 (갱신용 잠금)
pub const GET_GIG_STATS: &str = r#"
    SELECT id AS gig_id, ranking_score, total_orders, total_reviews
    FROM gigs
    WHERE id = $1
    FOR UPDATE
"#;

/// 긱 파생 필드 부분 갱신 (NULL 인 인자는 기존 값 유지)
pub const PATCH_GIG_STATS: &str = r#"
    UPDATE gigs
    SET ranking_score = COALESCE($2, ranking_score),
        total_orders = COALESCE($3, total_orders),
        total_reviews = COALESCE($4, total_reviews)
    WHERE id = $1
"#;
// endregion: --- Derived Fields

// region:    --- Directory
/// 사용자 조회
pub const GET_USER: &str = "SELECT id, user_role, registered_at FROM users WHERE id = $1";

/// 판매자 프로필 조회
pub const GET_SELLER: &str = r#"
    SELECT id, user_id, completion_rate, response_time, created_at AS joined_at
    FROM seller_profiles
    WHERE id = $1
"#;

/// 긱 조회 (이미지/태그 개수 포함)
pub const GET_GIG_LISTING: &str = r#"
    SELECT g.id, g.seller_id, g.title, g.description, g.is_active, g.conversion_rate,
           (SELECT COUNT(*) FROM gig_images i WHERE i.gig_id = g.id)::INT4 AS image_count,
           (SELECT COUNT(*) FROM gig_tags t WHERE t.gig_id = g.id)::INT4 AS tag_count
    FROM gigs g
    WHERE g.id = $1
"#;

/// 긱의 활성 패키지 조회
pub const GET_ACTIVE_PACKAGE: &str = r#"
    SELECT id, gig_id, package_type, price, delivery_time, revision_count, is_active
    FROM gig_packages
    WHERE id = $1 AND gig_id = $2 AND is_active = TRUE
"#;
// endregion: --- Directory

// region:    --- Notifications
/// 알림 기록
pub const INSERT_NOTIFICATION: &str = r#"
    INSERT INTO notifications (user_id, kind, content, related_entity_type, related_entity_id,
                               created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;
// endregion: --- Notifications

// region:    --- Schema
/// 스키마 존재 여부
pub const SCHEMA_EXISTS: &str = "SELECT to_regclass('public.orders') IS NOT NULL AS present";
// endregion: --- Schema
