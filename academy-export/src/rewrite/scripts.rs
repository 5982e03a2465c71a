//! Client-side replacements for server endpoints, injected into exported pages.
//!
//! Each script carries a fixed `id` so the rewriter can tell it was already
//! injected.

pub const PROGRESS_SCRIPT_ID: &str = "static-progress-js";
pub const QUIZ_SCRIPT_ID: &str = "static-quiz-js";
pub const QUIZ_KEY_ID: &str = "static-quiz-key";

/// `localStorage` key holding `{ lesson_id: completed_at }`
pub const PROGRESS_STORAGE_KEY: &str = "academy_progress";
/// `localStorage` key holding `{ quiz_id: best_attempt }`
pub const QUIZ_STORAGE_KEY: &str = "academy_quiz_best";

/// Lesson completion toggle backed by `localStorage`
pub const PROGRESS_JS: &str = r#"
<script id="static-progress-js">
(function () {
  var STORAGE_KEY = 'academy_progress';

  function load() {
    try { return JSON.parse(localStorage.getItem(STORAGE_KEY) || '{}') || {}; }
    catch (e) { return {}; }
  }

  function save(data) {
    localStorage.setItem(STORAGE_KEY, JSON.stringify(data));
  }

  function toggle(lessonId) {
    var data = load();
    if (data[lessonId]) { delete data[lessonId]; }
    else { data[lessonId] = new Date().toISOString(); }
    save(data);
    return !!data[lessonId];
  }

  function render(wrap, lessonId, completed) {
    wrap.innerHTML = '';
    var btn = document.createElement('button');
    btn.type = 'button';
    btn.className = 'btn ' + (completed ? 'btn-success' : 'btn-outline');
    btn.textContent = completed ? '✅ Completed' : 'Mark Complete';
    btn.setAttribute('data-progress-toggle', lessonId);
    btn.addEventListener('click', function () {
      render(wrap, lessonId, toggle(lessonId));
      if (window.academyRefreshSidebar) { window.academyRefreshSidebar(); }
    });
    wrap.appendChild(btn);
  }

  document.addEventListener('DOMContentLoaded', function () {
    var wrap = document.getElementById('progress-btn-wrap');
    if (!wrap) return;
    var input = wrap.querySelector('input[name="lesson_id"]');
    if (!input || !input.value) return;
    render(wrap, input.value, !!load()[input.value]);
  });
})();
</script>
"#;

/// Recomputes sidebar badges from `localStorage`
pub const SIDEBAR_JS: &str = r#"
<script id="static-sidebar-progress-js">
(function () {
  function refresh() {
    var data;
    try { data = JSON.parse(localStorage.getItem('academy_progress') || '{}') || {}; }
    catch (e) { data = {}; }

    document.querySelectorAll('[data-module-lessons]').forEach(function (el) {
      var lessons;
      try { lessons = JSON.parse(el.getAttribute('data-module-lessons')); }
      catch (e) { return; }
      var done = lessons.filter(function (id) { return !!data[id]; }).length;
      var badge = el.querySelector('.sidebar-badge');
      if (!badge) return;
      badge.textContent = done + '/' + lessons.length;
      badge.classList.toggle('badge-done', lessons.length > 0 && done === lessons.length);
    });
  }

  window.academyRefreshSidebar = refresh;
  document.addEventListener('DOMContentLoaded', refresh);
})();
</script>
"#;

/// Client-side quiz grading. Reads the answer key from the JSON block with
/// id `static-quiz-key`.
pub const QUIZ_JS: &str = r#"
<script id="static-quiz-js">
(function () {
  var STORAGE_KEY = 'academy_quiz_best';

  function loadBest() {
    try { return JSON.parse(localStorage.getItem(STORAGE_KEY) || '{}') || {}; }
    catch (e) { return {}; }
  }

  function showBest(box, best) {
    if (!box) return;
    box.textContent = best
      ? 'Best score: ' + best.score + '/' + best.total + ' (' + best.pct + '%)'
      : '';
  }

  document.addEventListener('DOMContentLoaded', function () {
    var form = document.getElementById('quiz-form');
    var keyEl = document.getElementById('static-quiz-key');
    if (!form || !keyEl) return;

    var key;
    try { key = JSON.parse(keyEl.textContent); }
    catch (e) { return; }

    var bestBox = document.getElementById('quiz-best');
    showBest(bestBox, loadBest()[key.quiz_id]);

    form.addEventListener('submit', function (ev) {
      ev.preventDefault();
      var correct = 0;

      key.questions.forEach(function (q) {
        var chosen = form.querySelector('input[name="' + q.id + '"]:checked');
        var answer = chosen ? chosen.value : '';
        var ok = answer === q.correct;
        if (ok) correct += 1;

        var block = form.querySelector('[data-question-id="' + q.id + '"]');
        var feedback = block && block.querySelector('.quiz-feedback');
        if (!feedback) return;
        feedback.hidden = false;
        feedback.className = 'quiz-feedback ' + (ok ? 'correct' : 'incorrect');
        feedback.textContent = (ok ? 'Correct.' : 'Incorrect. Correct answer: ' + q.correct + '.')
          + (q.explanation ? ' ' + q.explanation : '');
      });

      var total = key.questions.length;
      var pct = total ? Math.floor(correct * 100 / total) : 0;
      var passing = pct >= key.passing_score;

      var result = document.getElementById('quiz-result');
      if (!result) {
        result = document.createElement('section');
        result.id = 'quiz-result';
        form.parentNode.insertBefore(result, form);
      }
      result.className = 'quiz-result ' + (passing ? 'pass' : 'fail');
      result.textContent = (passing ? 'Passed' : 'Not yet') + ': '
        + correct + '/' + total + ' (' + pct + '%)';

      var all = loadBest();
      var prev = all[key.quiz_id];
      if (!prev || correct >= prev.score) {
        all[key.quiz_id] = {
          score: correct, total: total, pct: pct,
          attempted_at: new Date().toISOString()
        };
        localStorage.setItem(STORAGE_KEY, JSON.stringify(all));
      }
      showBest(bestBox, all[key.quiz_id]);
    });
  });
})();
</script>
"#;
