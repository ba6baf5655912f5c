pub(super) const SELECT_PERSONAL_CANDIDATES: &str = r#"
    SELECT p.id,
           p.author_id,
           p.created_at,
           p.reaction_count,
           p.comment_count,
           p.share_count,
           CASE WHEN f.follower_id IS NULL THEN 0 ELSE 1 END AS is_followed
    FROM posts p
    LEFT JOIN follows f
        ON f.followee_id = p.author_id
       AND f.follower_id = ?1
       AND f.active = 1
    WHERE p.published = 1
      AND p.created_at >= ?2
      AND (
          p.author_id = ?1
          OR (f.follower_id IS NOT NULL AND p.privacy IN ('public', 'followers'))
      )
    ORDER BY p.created_at DESC, p.id DESC
    LIMIT ?3
"#;

pub(super) const SELECT_DISCOVERY_CANDIDATES: &str = r#"
    SELECT p.id,
           p.author_id,
           p.created_at,
           p.reaction_count,
           p.comment_count,
           p.share_count
    FROM posts p
    WHERE p.published = 1
      AND p.privacy = 'public'
      AND p.created_at >= ?2
      AND p.author_id != ?1
      AND p.author_id NOT IN (
          SELECT followee_id FROM follows
          WHERE follower_id = ?1 AND active = 1
      )
    ORDER BY (p.reaction_count + ?3 * p.comment_count + ?4 * p.share_count) DESC,
             p.created_at DESC,
             p.id DESC
    LIMIT ?5
"#;

pub(super) const INSERT_CACHE_ENTRY: &str = r#"
    INSERT INTO timeline_cache (
        viewer_id,
        generation_id,
        post_id,
        score,
        post_created_at,
        computed_at,
        expires_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub(super) const UPSERT_GENERATION_POINTER: &str = r#"
    INSERT INTO timeline_generations (viewer_id, generation_id, computed_at, expires_at, entry_count)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(viewer_id) DO UPDATE SET
        generation_id = excluded.generation_id,
        computed_at = excluded.computed_at,
        expires_at = excluded.expires_at,
        entry_count = excluded.entry_count
"#;

pub(super) const SELECT_GENERATION_POINTER: &str = r#"
    SELECT generation_id, computed_at, expires_at, entry_count
    FROM timeline_generations
    WHERE viewer_id = ?1
"#;

pub(super) const SELECT_TIMELINE_PAGE: &str = r#"
    SELECT post_id, score, post_created_at, computed_at, expires_at
    FROM timeline_cache
    WHERE viewer_id = ?1
      AND generation_id = ?2
      AND score >= ?3
    ORDER BY score DESC, post_created_at DESC, post_id DESC
    LIMIT ?4 OFFSET ?5
"#;

pub(super) const COUNT_TIMELINE_ENTRIES: &str = r#"
    SELECT COUNT(*) AS entry_count
    FROM timeline_cache
    WHERE viewer_id = ?1
      AND generation_id = ?2
      AND score >= ?3
"#;

pub(super) const SWEEP_EXPIRED_ENTRIES: &str = r#"
    DELETE FROM timeline_cache
    WHERE expires_at <= ?1
      AND NOT EXISTS (
          SELECT 1 FROM timeline_generations g
          WHERE g.viewer_id = timeline_cache.viewer_id
            AND g.generation_id = timeline_cache.generation_id
      )
"#;

pub(super) const SELECT_FOLLOWING_PAGE: &str = r#"
    SELECT p.id
    FROM posts p
    WHERE p.published = 1
      AND (
          p.author_id = ?1
          OR EXISTS (
              SELECT 1 FROM follows f
              WHERE f.follower_id = ?1
                AND f.followee_id = p.author_id
                AND f.active = 1
                AND p.privacy IN ('public', 'followers')
          )
      )
    ORDER BY p.created_at DESC, p.id DESC
    LIMIT ?2 OFFSET ?3
"#;

pub(super) const COUNT_FOLLOWING_POSTS: &str = r#"
    SELECT COUNT(*) AS post_count
    FROM posts p
    WHERE p.published = 1
      AND (
          p.author_id = ?1
          OR EXISTS (
              SELECT 1 FROM follows f
              WHERE f.follower_id = ?1
                AND f.followee_id = p.author_id
                AND f.active = 1
                AND p.privacy IN ('public', 'followers')
          )
      )
"#;

pub(super) const SELECT_ENGAGED_PUBLIC_POSTS: &str = r#"
    SELECT id, author_id, created_at, reaction_count, comment_count, share_count
    FROM posts
    WHERE published = 1
      AND privacy = 'public'
      AND created_at >= ?1
    ORDER BY (reaction_count + ?2 * comment_count + ?3 * share_count) DESC,
             created_at DESC,
             id DESC
    LIMIT ?4
"#;
